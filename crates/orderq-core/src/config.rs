/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`. Field names map to upper-cased env
/// vars (`database_url` reads `DATABASE_URL`); fields marked `#[serde(default)]`
/// fall back when the variable is absent.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Build from explicit key/value pairs instead of the process environment.
    fn from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs)
    }
}
