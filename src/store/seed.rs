use std::fs;
use std::path::Path;

use super::Tables;
use crate::error::Result;

/// Reads the JSON seed. A missing file yields empty tables.
pub fn load_tables(path: &Path) -> Result<Tables> {
    if !path.exists() {
        tracing::warn!("No store seed at {}, starting empty", path.display());
        return Ok(Tables::default());
    }

    let content = fs::read_to_string(path)?;
    let tables: Tables = serde_json::from_str(&content)?;
    Ok(tables)
}

/// Writes the tables as pretty JSON, replacing the file atomically.
pub fn save_tables(path: &Path, tables: &Tables) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(tables)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;
    use tempfile::TempDir;

    #[test]
    fn test_missing_seed_is_empty() {
        let temp = TempDir::new().unwrap();
        let tables = load_tables(&temp.path().join("store.json")).unwrap();
        assert!(tables.users.is_empty());
        assert!(tables.reviews.is_empty());
    }

    #[test]
    fn test_partial_seed_defaults_missing_collections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        fs::write(
            &path,
            r#"{"users":[{"user_id":"u1","email":"a@x","display_name":"A","identicon":"i"}]}"#,
        )
        .unwrap();

        let tables = load_tables(&path).unwrap();
        assert_eq!(tables.users.len(), 1);
        assert!(!tables.users.iter().next().unwrap().is_admin);
        assert!(tables.critiqued_grades.is_empty());
    }

    #[test]
    fn test_save_then_load_keeps_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("store.json");

        let mut tables = Tables::default();
        tables.users.insert(User {
            user_id: "u1".into(),
            email: "a@example.com".into(),
            display_name: "Ada".into(),
            identicon: "abc".into(),
            is_admin: true,
        });
        save_tables(&path, &tables).unwrap();

        let loaded = load_tables(&path).unwrap();
        assert_eq!(loaded.users, tables.users);
    }
}
