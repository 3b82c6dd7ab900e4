use tabled::{
    Table,
    Tabled,
    settings::{Panel, Style},
};

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    header: Option<String>,
}

impl Formatter {
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn build<T: Tabled, I: IntoIterator<Item = T>>(self, data: I) -> Table {
        let mut table = Table::new(data);
        if let Some(header) = self.header {
            table.with(Panel::header(header));
        }

        table.with(Style::blank());
        table
    }
}
