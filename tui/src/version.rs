/// The keyprompt version.
///
/// Release builds may inject the tag version through the `KEYPROMPT_VERSION` environment variable;
/// otherwise this is the workspace Cargo package version.
pub const KEYPROMPT_VERSION: &str = match option_env!("KEYPROMPT_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
