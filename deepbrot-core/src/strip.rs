use serde::{Deserialize, Serialize};

/// A contiguous band of image rows (always u32 coordinates).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strip {
    pub origin_row: u32,
    pub row_count: u32,
}

impl Strip {
    pub fn new(origin_row: u32, row_count: u32) -> Self {
        Self {
            origin_row,
            row_count,
        }
    }

    /// First row past the strip.
    pub fn end_row(&self) -> u32 {
        self.origin_row + self.row_count
    }
}

/// Target strip height for a canvas: a handful of strips per worker keeps
/// the pool busy without drowning it in tiny jobs.
pub fn strip_height(height: u32, worker_count: usize) -> u32 {
    (height / (worker_count.max(1) as u32 * 6)).max(16)
}

/// Partition `height` rows into contiguous strips of `target_height`
/// (the last one short).
pub fn partition_rows(height: u32, target_height: u32) -> Vec<Strip> {
    let target = target_height.max(1);
    let mut strips = Vec::new();
    let mut row = 0;
    while row < height {
        let rows = target.min(height - row);
        strips.push(Strip::new(row, rows));
        row += rows;
    }
    strips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_every_row_exactly_once() {
        let strips = partition_rows(1080, 64);
        let mut next = 0;
        for strip in &strips {
            assert_eq!(strip.origin_row, next);
            assert!(strip.row_count > 0);
            next = strip.end_row();
        }
        assert_eq!(next, 1080);
    }

    #[test]
    fn partition_last_strip_is_short() {
        let strips = partition_rows(100, 30);
        assert_eq!(strips.len(), 4);
        assert_eq!(strips[3], Strip::new(90, 10));
    }

    #[test]
    fn partition_of_empty_canvas_is_empty() {
        assert!(partition_rows(0, 64).is_empty());
    }

    #[test]
    fn partition_single_strip_when_target_exceeds_height() {
        let strips = partition_rows(50, 200);
        assert_eq!(strips, vec![Strip::new(0, 50)]);
    }

    #[test]
    fn strip_height_floors_at_sixteen_rows() {
        assert_eq!(strip_height(100, 8), 16);
        assert_eq!(strip_height(1080, 1), 180);
        // 2160 / (4 * 6) = 90
        assert_eq!(strip_height(2160, 4), 90);
    }

    #[test]
    fn serialization_roundtrip() {
        let original = Strip::new(128, 64);
        let json = serde_json::to_string(&original).unwrap();
        let restored: Strip = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }
}
