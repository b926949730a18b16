//! Work-item id generation.
//!
//! Each course unit exposes numbered sections plus one intro node, all
//! addressed by SCO ids of the form `m-3-{unit}-{section}`. The queue lists
//! every section of every unit first, then the intro nodes; items are
//! independent, so the order only affects progress reporting.

pub const DEFAULT_MAX_SECTION: u32 = 40;

/// Units 1 through 8, what most course books ship with.
pub fn default_units() -> Vec<u32> {
    (1..=8).collect()
}

/// Generate the ordered work queue for the given units.
pub fn generate_work_items(target_units: &[u32], max_section: u32) -> Vec<String> {
    let mut ids = Vec::with_capacity(target_units.len() * (max_section as usize + 1));
    for unit in target_units {
        for section in 1..=max_section {
            ids.push(format!("m-3-{unit}-{section}"));
        }
    }
    for unit in target_units {
        ids.push(format!("m-3-{unit}-intro"));
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_order() {
        let ids = generate_work_items(&[1, 2], 2);
        assert_eq!(
            ids,
            vec![
                "m-3-1-1",
                "m-3-1-2",
                "m-3-2-1",
                "m-3-2-2",
                "m-3-1-intro",
                "m-3-2-intro",
            ]
        );
    }

    #[test]
    fn test_default_queue_size() {
        let ids = generate_work_items(&default_units(), DEFAULT_MAX_SECTION);
        // 8 units * 40 sections + 8 intros
        assert_eq!(ids.len(), 8 * 40 + 8);
        assert_eq!(ids.first().map(String::as_str), Some("m-3-1-1"));
        assert_eq!(ids.last().map(String::as_str), Some("m-3-8-intro"));
    }
}
