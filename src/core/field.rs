/// A source path into the flattened record and the column label it is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub path: &'static str,
    pub label: &'static str,
}

impl Field {
    pub const fn renamed(path: &'static str, label: &'static str) -> Self {
        Self { path, label }
    }

    pub const fn kept(path: &'static str) -> Self {
        Self { path, label: path }
    }
}

/// Ordered list of wanted fields for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    fields: &'static [Field],
}

impl FieldSpec {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Keep only these fields, in this order, under their labels.
    Fields(FieldSpec),
    /// Keep every flattened column in first-seen order.
    AllColumns,
}
