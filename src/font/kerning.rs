//! Kerning class tables
//!
//! Pairs are first laid out as a full matrix with one class per glyph, then
//! compacted: rows with identical offsets are merged into one left class,
//! then columns with identical offsets into one right class.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KerningClassTable {
    pub left_classes: Vec<Vec<String>>,
    pub right_classes: Vec<Vec<String>>,
    /// `offsets[left][right]`
    pub offsets: Vec<Vec<i64>>,
}

impl KerningClassTable {
    /// One class per glyph, in order of first appearance. A repeated pair
    /// overwrites the earlier offset.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str, i64)>) -> Self {
        let mut table = Self::default();
        for (left, right, offset) in pairs {
            let row = match table.left_classes.iter().position(|c| c[0] == left) {
                Some(row) => row,
                None => {
                    table.left_classes.push(vec![left.to_string()]);
                    table.offsets.push(vec![0; table.right_classes.len()]);
                    table.left_classes.len() - 1
                }
            };
            let column = match table.right_classes.iter().position(|c| c[0] == right) {
                Some(column) => column,
                None => {
                    table.right_classes.push(vec![right.to_string()]);
                    for row in &mut table.offsets {
                        row.push(0);
                    }
                    table.right_classes.len() - 1
                }
            };
            table.offsets[row][column] = offset;
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Merge duplicate rows, then duplicate columns
    pub fn compact(&mut self) {
        let mut i = 0;
        while i < self.offsets.len() {
            let mut j = i + 1;
            while j < self.offsets.len() {
                if self.offsets[i] == self.offsets[j] {
                    let merged = self.left_classes.remove(j);
                    self.left_classes[i].extend(merged);
                    self.offsets.remove(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        let mut i = 0;
        while i < self.right_classes.len() {
            let mut j = i + 1;
            while j < self.right_classes.len() {
                if self.offsets.iter().all(|row| row[i] == row[j]) {
                    let merged = self.right_classes.remove(j);
                    self.right_classes[i].extend(merged);
                    for row in &mut self.offsets {
                        row.remove(j);
                    }
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }

    /// Offset between two glyphs, if both are in a class
    pub fn offset(&self, left: &str, right: &str) -> Option<i64> {
        let row = self.left_classes.iter().position(|c| c.iter().any(|g| g == left))?;
        let column = self.right_classes.iter().position(|c| c.iter().any(|g| g == right))?;
        Some(self.offsets[row][column])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KerningClassTable {
        KerningClassTable::from_pairs([
            ("A", "V", -80),
            ("A", "W", -60),
            ("L", "V", -80),
            ("L", "W", -60),
            ("T", "o", -40),
            ("P", "o", -40),
            ("A", "T", -50),
            ("L", "T", -50),
        ])
    }

    #[test]
    fn test_from_pairs_builds_full_matrix() {
        let table = sample();
        assert_eq!(table.left_classes.len(), 4);
        assert_eq!(table.right_classes.len(), 4);
        assert_eq!(table.offsets[2], vec![0, 0, -40, 0]);
    }

    #[test]
    fn test_compact_merges_rows_and_columns() {
        let mut table = sample();
        table.compact();
        assert_eq!(
            table.left_classes,
            vec![vec!["A".to_string(), "L".to_string()], vec!["T".to_string(), "P".to_string()]]
        );
        assert_eq!(table.right_classes.len(), 4);
        assert_eq!(table.offset("L", "W"), Some(-60));
        assert_eq!(table.offset("P", "o"), Some(-40));
        assert_eq!(table.offset("P", "V"), Some(0));
        assert_eq!(table.offset("V", "A"), None);
    }

    #[test]
    fn test_compact_merges_equal_columns() {
        let mut table = KerningClassTable::from_pairs([("A", "V", -80), ("A", "W", -80), ("T", "o", -40)]);
        table.compact();
        assert_eq!(table.right_classes[0], vec!["V".to_string(), "W".to_string()]);
        assert_eq!(table.offsets, vec![vec![-80, 0], vec![0, -40]]);
    }

    #[test]
    fn test_compact_is_idempotent() {
        let mut once = sample();
        once.compact();
        let mut twice = once.clone();
        twice.compact();
        assert_eq!(once, twice);
    }
}
