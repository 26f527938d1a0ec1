#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnNote {
  Primary,
  /// Filled in by the database (defaults, serials).  Skipped by inserts.
  Generated,
  None,
}

#[derive(Debug, Clone)]
pub struct ColumnMapper {
  pub name: String,
  pub column: String,
  pub note: ColumnNote,
}

impl Default for ColumnMapper {
  fn default() -> Self {
    Self {
      name: "".to_string(),
      column: "".to_string(),
      note: ColumnNote::None,
    }
  }
}

pub fn column(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: name.to_string(),
    note: ColumnNote::None,
  }
}

pub fn primary(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    note: ColumnNote::Primary,
    ..column(name)
  }
}

pub fn generated(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    note: ColumnNote::Generated,
    ..column(name)
  }
}

#[derive(Debug, Default, Clone)]
pub struct ColumnMappers {
  pub table_name: &'static str,
  pub columns: Vec<ColumnMapper>,
}

impl ColumnMappers {
  fn insertable(&self) -> impl Iterator<Item = &ColumnMapper> {
    self.columns.iter().filter(|col| col.note == ColumnNote::None)
  }

  /// Comma separated column list, optionally qualified with a table alias.
  pub fn get_columns(&self, alias: Option<&str>) -> String {
    self.columns.iter().map(|col| {
      match alias {
        Some(alias) => format!("{}.{}", alias, col.column),
        None => col.column.clone(),
      }
    }).collect::<Vec<String>>().join(", ")
  }

  pub fn build_select_query(&self) -> String {
    format!("SELECT {} FROM {}", self.get_columns(None), self.table_name)
  }

  /// `INSERT` of every non-generated column, returning the full row.
  pub fn build_insert_query(&self) -> String {
    let (names, values): (Vec<_>, Vec<_>) = self.insertable()
      .enumerate()
      .map(|(idx, col)| (col.column.clone(), format!("${}", idx + 1)))
      .unzip();
    format!("INSERT INTO {}({}) VALUES({}) RETURNING {}",
      self.table_name, names.join(", "), values.join(", "), self.get_columns(None))
  }

  /// `UPDATE` of the named columns keyed on the primary column, returning the full row.
  /// Parameters are the set columns in order, then the key.
  pub fn build_update_query(&self, set: &[&str], extra: &str) -> String {
    let primary = self.columns.iter()
      .find(|col| col.note == ColumnNote::Primary)
      .map(|col| col.column.as_str())
      .unwrap_or("id");
    let mut sets: Vec<String> = set.iter()
      .enumerate()
      .map(|(idx, name)| format!("{} = ${}", name, idx + 1))
      .collect();
    if !extra.is_empty() {
      sets.push(extra.to_string());
    }
    format!("UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
      self.table_name, sets.join(", "), primary, set.len() + 1, self.get_columns(None))
  }
}
