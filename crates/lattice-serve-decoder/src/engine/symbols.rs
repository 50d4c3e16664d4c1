//! Word symbol table (id <-> text)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lattice_serve_core::error::ModelError;

/// Symbol table mapping word ids to text
///
/// Loaded from the model directory's text symbol file: one `word id` pair
/// per line. Ids may be sparse.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    words: HashMap<u32, String>,
}

impl SymbolTable {
    /// Build a table from explicit (id, word) entries
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self {
            words: entries.into_iter().collect(),
        }
    }

    /// Load a text symbol table file
    pub fn from_text_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ModelError::SymbolTable(format!("{}: {}", path.display(), e)))?;

        let mut words = HashMap::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line =
                line.map_err(|e| ModelError::SymbolTable(format!("{}: {}", path.display(), e)))?;
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (word, id) = match (fields.next(), fields.next()) {
                (Some(word), Some(id)) => (word, id),
                _ => {
                    return Err(ModelError::SymbolTable(format!(
                        "{}:{}: expected 'word id' pair",
                        path.display(),
                        line_no + 1
                    )))
                }
            };

            let id: u32 = id.parse().map_err(|_| {
                ModelError::SymbolTable(format!(
                    "{}:{}: invalid symbol id '{}'",
                    path.display(),
                    line_no + 1,
                    id
                ))
            })?;

            words.insert(id, word.to_string());
        }

        Ok(Self { words })
    }

    /// Look up the word for a symbol id
    pub fn find(&self, id: u32) -> Option<&str> {
        self.words.get(&id).map(|s| s.as_str())
    }

    /// Number of symbols in the table
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_entries() {
        let table =
            SymbolTable::from_entries([(0, "<eps>".to_string()), (1, "hello".to_string())]);
        assert_eq!(table.find(1), Some("hello"));
        assert_eq!(table.find(7), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_parse_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "<eps> 0").unwrap();
        writeln!(file, "hello 1").unwrap();
        writeln!(file, "world 2").unwrap();

        let table = SymbolTable::from_text_file(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.find(2), Some("world"));
    }

    #[test]
    fn test_malformed_line_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "only-a-word").unwrap();

        assert!(SymbolTable::from_text_file(&path).is_err());
    }

    #[test]
    fn test_missing_file_rejected() {
        assert!(SymbolTable::from_text_file("/nonexistent/words.txt").is_err());
    }
}
