use rand::Rng;

/// Expected database schema version
/// All workspace databases must use this version for compatibility
pub const EXPECTED_DB_VERSION: &str = "1";

/// Generate a unique workspace ID
/// Assigned once when a workspace database is created and used to tell
/// replicas of the same workspace apart from unrelated databases
pub fn generate_workspace_unique_id() -> String {
    format!(
        "ws_{}",
        rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(12)
            .map(char::from)
            .collect::<String>()
    )
}
