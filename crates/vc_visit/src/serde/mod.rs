//! A [`serde`](serde_core) view of schema-described values.
//!
//! [`SchemaSerializer`] presents any [`Visit`] value as a serde struct whose
//! fields are the schema's inspectable fields, so values can be dumped as
//! JSON or RON for debugging. Direct and read-hook fields carry no value and
//! are skipped. Unlike the binary format this view is produced recursively.

use alloc::vec::Vec;

use serde_core::ser::{SerializeStruct, Serializer};
use serde_core::Serialize;

use crate::element::{Element, Visit};
use crate::schema::{FieldView, schema_of};

// -----------------------------------------------------------------------------
// SchemaSerializer

/// Serializes a [`Visit`] value field by field, following its schema.
///
/// # Examples
///
/// ```
/// use vc_visit::{Schema, SchemaSerializer, Visit, lens};
///
/// #[derive(Default)]
/// struct Size { w: u16, h: u16 }
///
/// impl Visit for Size {
///     fn build_schema() -> Schema<Self> {
///         Schema::new().member("w", lens!(Size, w)).member("h", lens!(Size, h))
///     }
/// }
///
/// let json = serde_json::to_string(&SchemaSerializer::new(&Size { w: 3, h: 4 })).unwrap();
/// assert_eq!(json, r#"{"w":3,"h":4}"#);
/// ```
pub struct SchemaSerializer<'a, T>(&'a T);

impl<'a, T: Visit> SchemaSerializer<'a, T> {
    #[inline]
    pub const fn new(value: &'a T) -> Self {
        Self(value)
    }
}

/// Last path segment of a type name.
fn short_name(type_name: &'static str) -> &'static str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

impl<T: Visit> Serialize for SchemaSerializer<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let schema = schema_of::<T>();
        let views: Vec<(&'static str, FieldView<'_>)> = schema
            .fields()
            .iter()
            .filter_map(|field| Some((field.name(), field.ops().inspect(self.0)?)))
            .collect();

        let mut state = serializer.serialize_struct(short_name(schema.type_name()), views.len())?;
        for (name, view) in &views {
            state.serialize_field(*name, &**view)?;
        }
        state.end()
    }
}

// -----------------------------------------------------------------------------
// Field views

/// One element, primitive or composite.
pub(crate) struct ElementView<'a, F>(pub &'a F);

impl<F: Element> Serialize for ElementView<'_, F> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.inspect(serializer)
    }
}

/// Every element of a collection field.
pub(crate) struct SliceView<'a, F>(pub &'a [F]);

impl<F: Element> Serialize for SliceView<'_, F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(ElementView))
    }
}

/// An optional composite.
pub(crate) struct OptionView<'a, F>(pub Option<&'a F>);

impl<F: Element> Serialize for OptionView<'_, F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(value) => serializer.serialize_some(&ElementView(value)),
            None => serializer.serialize_none(),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{SchemaSerializer, short_name};
    use crate::{Schema, Visit, VisitError, lens};

    #[derive(Default)]
    struct Cell {
        value: i32,
    }

    impl Visit for Cell {
        fn build_schema() -> Schema<Self> {
            Schema::new().member("value", lens!(Cell, value))
        }
    }

    #[derive(Default)]
    struct Sheet {
        title: String,
        cells: Vec<Cell>,
        corner: [u8; 2],
        cursor: Option<Box<Cell>>,
        checked: bool,
    }

    impl Visit for Sheet {
        fn build_schema() -> Schema<Self> {
            Schema::new()
                .text("title", lens!(Sheet, title))
                .sequence("cells", lens!(Sheet, cells))
                .array("corner", lens!(Sheet, corner))
                .optional("cursor", lens!(Sheet, cursor))
                .getter_setter(
                    "cell_count",
                    |sheet: &Sheet| sheet.cells.len() as u32,
                    |_, _| Ok(()),
                )
                .on_read("checked", |sheet| -> Result<(), VisitError> {
                    sheet.checked = true;
                    Ok(())
                })
        }
    }

    #[test]
    fn json_follows_the_schema() {
        let sheet = Sheet {
            title: String::from("totals"),
            cells: vec![Cell { value: 1 }, Cell { value: -2 }],
            corner: [4, 5],
            cursor: None,
            checked: false,
        };
        let json = serde_json::to_value(SchemaSerializer::new(&sheet)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "title": "totals",
                "cells": [{ "value": 1 }, { "value": -2 }],
                "corner": [4, 5],
                "cursor": null,
                "cell_count": 2,
            })
        );

        let bytes = crate::serialize_to_vec(&sheet).unwrap();
        let decoded: Sheet = crate::from_slice(&bytes).unwrap();
        assert!(decoded.checked);
        assert_eq!(decoded.cells.len(), 2);
    }

    /// `Cell` and `Sheet` as plain serde types.
    mod derived {
        use alloc::string::String;
        use alloc::vec::Vec;

        #[derive(serde::Serialize)]
        pub struct Cell {
            pub value: i32,
        }

        #[derive(serde::Serialize)]
        pub struct Sheet {
            pub title: String,
            pub cells: Vec<Cell>,
            pub corner: Vec<u8>,
            pub cursor: Option<Cell>,
            pub cell_count: u32,
        }
    }

    #[test]
    fn output_matches_derived_serialize() {
        let sheet = Sheet {
            title: String::from("totals"),
            cells: vec![Cell { value: 1 }, Cell { value: -2 }],
            corner: [4, 5],
            cursor: Some(Box::new(Cell { value: 9 })),
            checked: true,
        };
        let expected = derived::Sheet {
            title: String::from("totals"),
            cells: vec![derived::Cell { value: 1 }, derived::Cell { value: -2 }],
            corner: vec![4, 5],
            cursor: Some(derived::Cell { value: 9 }),
            cell_count: 2,
        };

        assert_eq!(
            ron::ser::to_string(&SchemaSerializer::new(&sheet)).unwrap(),
            ron::ser::to_string(&expected).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&SchemaSerializer::new(&sheet)).unwrap(),
            serde_json::to_string(&expected).unwrap()
        );
    }

    #[test]
    fn ron_names_structs() {
        let cell = Cell { value: 7 };
        let text = ron::ser::to_string(&SchemaSerializer::new(&cell)).unwrap();
        assert_eq!(text, "(value:7)");
    }

    #[test]
    fn short_names() {
        assert_eq!(short_name("a::b::Cell"), "Cell");
        assert_eq!(short_name("a::Wrap<b::Inner>"), "Wrap");
        assert_eq!(short_name("Plain"), "Plain");
    }
}
