//! File provider: values looked up by dotted path in a JSON, YAML or TOML
//! document.
//!
//! The format is picked from the file extension when the provider is
//! created, and fixes the provider's name and tag key:
//!
//! | Extension         | Name               | Tag         |
//! |-------------------|--------------------|-------------|
//! | `.json`           | `JSONFileProvider` | `file_json` |
//! | `.yaml` / `.yml`  | `YAMLFileProvider` | `file_yaml` |
//! | `.toml`           | `TOMLFileProvider` | `file_toml` |
//!
//! A file with any other extension is treated as JSON and fails at init.
//!
//! The tag value is a dotted path such as `"database.url"`. Each segment
//! matches an object key exactly, or failing that case-insensitively. The
//! leaf must be a scalar (rendered as text) or an array of scalars (joined
//! with `;` so that slice fields receive every item).

use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};

use crate::coerce::{Location, SLICE_SEPARATOR, set_field};
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::tags::{FILE_JSON_TAG, FILE_TOML_TAG, FILE_YAML_TAG};
use crate::types::FieldDescriptor;
use crate::walk::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    /// Detect the format from the extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(FileFormat::Json),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }

    pub fn provider_name(self) -> &'static str {
        match self {
            FileFormat::Json => "JSONFileProvider",
            FileFormat::Yaml => "YAMLFileProvider",
            FileFormat::Toml => "TOMLFileProvider",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            FileFormat::Json => FILE_JSON_TAG,
            FileFormat::Yaml => FILE_YAML_TAG,
            FileFormat::Toml => FILE_TOML_TAG,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            FileFormat::Json => ".json",
            FileFormat::Yaml => ".yaml",
            FileFormat::Toml => ".toml",
        }
    }

    fn decode(self, content: &str) -> Result<Value, String> {
        match self {
            FileFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            FileFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
                .map(yaml_to_json)
                .map_err(|e| e.to_string()),
            FileFormat::Toml => toml::from_str::<toml::Table>(content)
                .map(|table| toml_to_json(toml::Value::Table(table)))
                .map_err(|e| e.to_string()),
        }
    }
}

/// Supplies values from a configuration file, read once at init.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
    format: FileFormat,
    data: Option<Value>,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = FileFormat::from_path(&path).unwrap_or(FileFormat::Json);
        Self {
            path,
            format,
            data: None,
        }
    }

    /// A JSON provider; init fails unless the path ends in `.json`.
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path, FileFormat::Json)
    }

    /// A YAML provider; init fails unless the path ends in `.yaml` or `.yml`.
    pub fn yaml(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path, FileFormat::Yaml)
    }

    /// A TOML provider; init fails unless the path ends in `.toml`.
    pub fn toml(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path, FileFormat::Toml)
    }

    fn with_format(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            path: path.into(),
            format,
            data: None,
        }
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn accepts_extension(&self) -> bool {
        match FileFormat::from_path(&self.path) {
            Some(detected) => detected == self.format,
            None => false,
        }
    }
}

impl Provider for FileProvider {
    fn name(&self) -> &str {
        self.format.provider_name()
    }

    fn tag(&self) -> &str {
        self.format.tag()
    }

    fn init(&mut self, _schema: &Schema) -> Result<(), ProviderError> {
        if !self.accepts_extension() {
            return Err(ProviderError::WrongExtension {
                path: self.path.clone(),
                expected: self.format.extension(),
            });
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| ProviderError::Io {
            path: self.path.clone(),
            source,
        })?;
        let data = self
            .format
            .decode(&content)
            .map_err(|reason| ProviderError::Decode {
                path: self.path.clone(),
                reason,
            })?;
        self.data = Some(data);
        Ok(())
    }

    fn provide(&self, field: &FieldDescriptor, location: Location<'_>) -> Result<(), ProviderError> {
        let key = field.tag(self.format.tag()).unwrap_or_default();
        if key.is_empty() {
            return Err(ProviderError::KeyEmpty);
        }
        let segments: Vec<&str> = key.split('.').collect();
        let leaf = self
            .data
            .as_ref()
            .and_then(|data| find(data, &segments))
            .filter(|value| !value.is_null())
            .ok_or_else(|| ProviderError::NotFound(key.to_string()))?;
        let text = stringify(leaf).ok_or_else(|| ProviderError::NotScalar(key.to_string()))?;
        set_field(field, location, &text)?;
        Ok(())
    }
}

fn find<'v>(node: &'v Value, segments: &[&str]) -> Option<&'v Value> {
    let (first, rest) = segments.split_first()?;
    let object = node.as_object()?;
    let child = object.get(*first).or_else(|| {
        let wanted = first.to_lowercase();
        object
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, value)| value)
    })?;
    if rest.is_empty() {
        Some(child)
    } else {
        find(child, rest)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// Whole floats print without a fraction (`1e3` -> `"1000"`) so integer
// fields can read them.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let parts = items.iter().map(scalar_text).collect::<Option<Vec<_>>>()?;
            Some(parts.join(&SLICE_SEPARATOR.to_string()))
        }
        other => scalar_text(other),
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(float_value).unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
                .collect::<Map<_, _>>(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match yaml_to_json(key) {
        Value::String(s) => s,
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => float_value(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect::<Map<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::coerce::Field;
    use crate::tags::Tags;

    fn provider(dir: &TempDir, name: &str, content: &str) -> FileProvider {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        let mut provider = FileProvider::new(path);
        provider.init(&Schema::default()).unwrap();
        provider
    }

    fn provide<T: Field>(
        provider: &FileProvider,
        tags: &'static [(&'static str, &'static str)],
        target: &mut T,
    ) -> Result<(), ProviderError> {
        let field = FieldDescriptor::new("field", Tags::new(tags));
        provider.provide(&field, target.location())
    }

    const JSON: &str = r#"{
        "Name": "json_name",
        "Inside": { "Beta": 42 },
        "hosts": ["a", "b"],
        "enabled": true,
        "nothing": null
    }"#;

    #[test]
    fn whole_floats_fill_integer_fields() {
        let dir = TempDir::new().unwrap();
        let provider = provider(
            &dir,
            "numbers.json",
            r#"{ "limit": 1e3, "ratio": 2.5, "negative": -4.0 }"#,
        );

        let mut limit = 0u32;
        provide(&provider, &[("file_json", "limit")], &mut limit).unwrap();
        assert_eq!(limit, 1000);

        let mut negative = 0i64;
        provide(&provider, &[("file_json", "negative")], &mut negative).unwrap();
        assert_eq!(negative, -4);

        let mut ratio = 0f64;
        provide(&provider, &[("file_json", "ratio")], &mut ratio).unwrap();
        assert_eq!(ratio, 2.5);
    }

    // --- Format detection tests ---

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.json")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("a.YML")), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path(Path::new("a.toml")), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_path(Path::new("a.file")), None);
    }

    #[test]
    fn name_and_tag_follow_format() {
        let json = FileProvider::new("config.json");
        assert_eq!(json.name(), "JSONFileProvider");
        assert_eq!(json.tag(), "file_json");
        let yaml = FileProvider::new("config.yml");
        assert_eq!(yaml.name(), "YAMLFileProvider");
        assert_eq!(yaml.tag(), "file_yaml");
    }

    // --- Init tests ---

    #[test]
    fn wrong_extension_fails_init() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dummy.file");
        fs::write(&path, "{}").unwrap();
        let mut provider = FileProvider::new(&path);
        match provider.init(&Schema::default()) {
            Err(err @ ProviderError::WrongExtension { .. }) => {
                assert!(err.to_string().contains("file must have .json extension"));
            }
            other => panic!("Expected WrongExtension, got {other:?}"),
        }
    }

    #[test]
    fn explicit_format_rejects_other_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();
        let mut provider = FileProvider::yaml(&path);
        assert_eq!(provider.name(), "YAMLFileProvider");
        match provider.init(&Schema::default()) {
            Err(ProviderError::WrongExtension { expected, .. }) => assert_eq!(expected, ".yaml"),
            other => panic!("Expected WrongExtension, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_fails_init() {
        let dir = TempDir::new().unwrap();
        let mut provider = FileProvider::new(dir.path().join("absent.json"));
        assert!(matches!(
            provider.init(&Schema::default()),
            Err(ProviderError::Io { .. })
        ));
    }

    #[test]
    fn malformed_file_fails_init() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let mut provider = FileProvider::new(path);
        assert!(matches!(
            provider.init(&Schema::default()),
            Err(ProviderError::Decode { .. })
        ));
    }

    // --- Lookup tests ---

    #[test]
    fn top_level_key() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, "config.json", JSON);
        let mut name = String::new();
        provide(&provider, &[("file_json", "name")], &mut name).unwrap();
        assert_eq!(name, "json_name");
    }

    #[test]
    fn nested_key_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, "config.json", JSON);
        let mut beta = 0i32;
        provide(&provider, &[("file_json", "inside.beta")], &mut beta).unwrap();
        assert_eq!(beta, 42);
    }

    #[test]
    fn array_fills_slice() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, "config.json", JSON);
        let mut hosts: Vec<String> = Vec::new();
        provide(&provider, &[("file_json", "hosts")], &mut hosts).unwrap();
        assert_eq!(hosts, vec!["a", "b"]);
    }

    #[test]
    fn bool_leaf() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, "config.json", JSON);
        let mut enabled = false;
        provide(&provider, &[("file_json", "enabled")], &mut enabled).unwrap();
        assert!(enabled);
    }

    #[test]
    fn missing_and_null_are_not_found() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, "config.json", JSON);
        let mut name = String::new();
        assert!(matches!(
            provide(&provider, &[("file_json", "absent")], &mut name),
            Err(ProviderError::NotFound(_))
        ));
        assert!(matches!(
            provide(&provider, &[("file_json", "nothing")], &mut name),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn object_leaf_is_not_scalar() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, "config.json", JSON);
        let mut name = String::new();
        assert!(matches!(
            provide(&provider, &[("file_json", "inside")], &mut name),
            Err(ProviderError::NotScalar(_))
        ));
    }

    #[test]
    fn empty_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, "config.json", JSON);
        let mut name = String::new();
        assert!(matches!(
            provide(&provider, &[("file_json", "")], &mut name),
            Err(ProviderError::KeyEmpty)
        ));
    }

    #[test]
    fn yaml_document() {
        let dir = TempDir::new().unwrap();
        let provider = provider(
            &dir,
            "config.yaml",
            "database:\n  url: postgres://yaml\n  pool: 8\nports:\n  - 80\n  - 443\n",
        );
        let mut url = String::new();
        provide(&provider, &[("file_yaml", "database.url")], &mut url).unwrap();
        assert_eq!(url, "postgres://yaml");

        let mut pool = 0u8;
        provide(&provider, &[("file_yaml", "database.pool")], &mut pool).unwrap();
        assert_eq!(pool, 8);

        let mut ports: Vec<u16> = Vec::new();
        provide(&provider, &[("file_yaml", "ports")], &mut ports).unwrap();
        assert_eq!(ports, vec![80, 443]);
    }

    #[test]
    fn yaml_numeric_keys_are_stringified() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, "config.yml", "levels:\n  1: low\n");
        let mut level = String::new();
        provide(&provider, &[("file_yaml", "levels.1")], &mut level).unwrap();
        assert_eq!(level, "low");
    }

    #[test]
    fn toml_document() {
        let dir = TempDir::new().unwrap();
        let provider = provider(
            &dir,
            "config.toml",
            "[server]\nhost = \"toml.local\"\nratio = 0.5\n",
        );
        let mut host = String::new();
        provide(&provider, &[("file_toml", "server.host")], &mut host).unwrap();
        assert_eq!(host, "toml.local");

        let mut ratio: Option<f64> = None;
        provide(&provider, &[("file_toml", "server.ratio")], &mut ratio).unwrap();
        assert_eq!(ratio, Some(0.5));
    }
}
