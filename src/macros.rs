/// Defines a struct and implements [`Record`](crate::Record) and
/// [`Bencode`](crate::Bencode) for it.
///
/// Each field may carry a tag after `=>`, using the same syntax as
/// [`FieldSet::field`](crate::FieldSet::field): a wire name override,
/// `omitempty`, or `"-"` to leave the field out entirely. Fields tagged
/// `"-"` may have any type, including types with no bencode form.
///
/// ```
/// use bencodec::{bencode_record, decode, encode};
///
/// bencode_record! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct FileEntry {
///         pub length: i64,
///         pub path: Vec<String>,
///         pub md5sum: String => ",omitempty",
///         pub opened: Option<std::time::Instant> => "-",
///     }
/// }
///
/// let entry = FileEntry {
///     length: 5,
///     path: vec!["a.txt".into()],
///     ..Default::default()
/// };
/// let bytes = encode(&entry).unwrap();
/// assert_eq!(bytes, b"d6:lengthi5e4:pathl5:a.txtee");
/// assert_eq!(decode::<FileEntry>(&bytes).unwrap(), entry);
/// ```
#[macro_export]
macro_rules! bencode_record {
    (@tag) => { "" };
    (@tag $tag:tt) => { $tag };
    (@declare $fields:ident, $field:ident, $field_ty:ty, "-") => {
        $fields.ignore(stringify!($field));
    };
    (@declare $fields:ident, $field:ident, $field_ty:ty $(, $tag:tt)?) => {
        $fields.field::<$field_ty>(
            stringify!($field),
            $crate::bencode_record!(@tag $($tag)?),
            |record| &record.$field,
            |record| &mut record.$field,
        );
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty $(=> $tag:tt)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Record for $name {
            fn declare(fields: &mut $crate::FieldSet<Self>) {
                $(
                    $crate::bencode_record!(@declare fields, $field, $field_ty $(, $tag)?);
                )*
            }
        }

        impl $crate::Bencode for $name {
            fn strategy(
                registry: &$crate::Registry,
            ) -> ::std::result::Result<$crate::Strategy<Self>, $crate::BencodeError> {
                $crate::Strategy::record(registry)
            }
        }
    };
}
