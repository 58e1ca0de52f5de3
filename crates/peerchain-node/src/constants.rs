pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";
