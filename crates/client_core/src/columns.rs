use shared::domain::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub key: &'static str,
    pub label: &'static str,
    pub width: Option<&'static str>,
    pub sortable: bool,
}

impl ColumnDef {
    const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            width: None,
            sortable: true,
        }
    }

    const fn width(mut self, width: &'static str) -> Self {
        self.width = Some(width);
        self
    }

    const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

pub const USER_COLUMNS: [ColumnDef; 6] = [
    ColumnDef::new("id", "ID").width("70px"),
    ColumnDef::new("name", "Name"),
    ColumnDef::new("document", "Document").width("150px"),
    ColumnDef::new("email", "Email"),
    ColumnDef::new("phone", "Phone").width("200px"),
    ColumnDef::new("actions", "Actions").width("100px").unsortable(),
];

pub fn user_columns() -> &'static [ColumnDef] {
    &USER_COLUMNS
}

pub fn user_column(key: &str) -> Option<&'static ColumnDef> {
    USER_COLUMNS.iter().find(|column| column.key == key)
}

/// Text rendering of a row, keyed by column.
pub trait TableRow {
    fn cell(&self, key: &str) -> Option<String>;
}

impl TableRow for UserRecord {
    fn cell(&self, key: &str) -> Option<String> {
        match key {
            "id" => Some(self.id.to_string()),
            "name" => Some(self.name.clone()),
            "document" => Some(self.document.clone()),
            "email" => Some(self.email.clone()),
            "phone" => Some(self.phone.clone()),
            _ => None,
        }
    }
}
