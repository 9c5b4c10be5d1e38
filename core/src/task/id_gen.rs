use chrono::Utc;
use uuid::Uuid;

use super::types::TaskKind;

/// Format: {dl|tr}-{YYYYMMDDHHmmss}-{random8}
///
/// The random suffix keeps ids collision-free under concurrent creation
/// within the same second.
pub fn generate_task_id(kind: TaskKind) -> String {
    let ts = Utc::now().format("%Y%m%d%H%M%S");
    let uuid = Uuid::new_v4().simple().to_string();
    let suffix = &uuid[..8];
    format!("{}-{}-{}", kind.id_prefix(), ts, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    #[test]
    fn id_format() {
        let id = generate_task_id(TaskKind::Download);
        let re = Regex::new(r"^dl-\d{14}-[a-f0-9]{8}$").unwrap();
        assert!(re.is_match(&id), "generated id: {}", id);

        let id = generate_task_id(TaskKind::Transcribe);
        assert!(id.starts_with("tr-"));
    }

    #[test]
    fn ids_are_unique() {
        let mut ids = HashSet::new();
        for _ in 0..500 {
            let id = generate_task_id(TaskKind::Download);
            assert!(ids.insert(id.clone()), "duplicate id: {}", id);
        }
    }
}
