use crate::errors::ConfigError;
use crate::workers::{available_cores, resolve_worker_count};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fmt;

/// Environment keys read by [`InferenceConfig`]. Matching is case-insensitive.
pub const FIELDS: [&str; 10] = [
    "num_workers",
    "log_level",
    "dev_mode",
    "port",
    "auth_token",
    "ocr_languages",
    "do_code_enrichment",
    "do_formula_enrichment",
    "do_picture_classification",
    "do_picture_description",
];

/// Settings for the inference server, loaded once at startup.
#[derive(Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    /// Raw worker setting, see [`crate::workers`] for its sentinel values.
    pub num_workers: Option<f64>,
    pub log_level: String,
    pub dev_mode: bool,
    pub port: u16,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    /// Comma separated OCR language codes, kept verbatim.
    pub ocr_languages: String,
    pub do_code_enrichment: bool,
    pub do_formula_enrichment: bool,
    pub do_picture_classification: bool,
    pub do_picture_description: bool,
}

impl InferenceConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_os_vars(env::vars_os())
    }

    /// Load configuration from raw OS strings. A recognised key whose value is
    /// not valid UTF-8 is an error naming that key; unrelated keys are skipped.
    pub fn from_os_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut decoded = Vec::new();
        for (key, value) in vars {
            let Some(key) = key.to_str() else {
                continue;
            };
            let Some(field) = field_name(key) else {
                continue;
            };
            let value = value
                .into_string()
                .map_err(|_| ConfigError::NonUnicode { field })?;
            decoded.push((key.to_string(), value));
        }

        Self::from_vars(decoded)
    }

    /// Load configuration from an explicit set of variables instead of the
    /// process environment. Unrelated keys are ignored.
    ///
    /// When one field is given under several spellings (`PORT`, `Port`, `port`)
    /// the spelling that sorts first byte-wise wins, so the upper-case name takes
    /// precedence regardless of input order.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut chosen: BTreeMap<&'static str, (String, String)> = BTreeMap::new();
        for (key, value) in vars {
            let key: String = key.into();
            let Some(field) = field_name(&key) else {
                continue;
            };
            match chosen.get(field) {
                Some((existing, _)) if *existing <= key => {}
                _ => {
                    chosen.insert(field, (key, value.into()));
                }
            }
        }

        let source: config::Map<String, String> = chosen
            .into_iter()
            .map(|(field, (_, value))| (field.to_string(), value))
            .collect();

        let settings = config::Config::builder()
            .set_default("log_level", "INFO")?
            .set_default("dev_mode", false)?
            .set_default("port", 8080_i64)?
            .set_default("ocr_languages", "en,es,fr,de,sv")?
            .set_default("do_code_enrichment", true)?
            .set_default("do_formula_enrichment", true)?
            .set_default("do_picture_classification", true)?
            .set_default("do_picture_description", true)?
            .add_source(config::Environment::default().source(Some(source)))
            .build()?;

        Ok(settings.try_deserialize::<Self>()?)
    }

    /// Worker count resolved against the cores available right now.
    pub fn resolved_worker_count(&self) -> Option<i64> {
        resolve_worker_count(self.num_workers, available_cores())
    }

    pub fn ocr_language_list(&self) -> Vec<&str> {
        self.ocr_languages
            .split(',')
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .collect()
    }
}

/// Canonical field for an environment key, matched case-insensitively.
fn field_name(key: &str) -> Option<&'static str> {
    FIELDS
        .iter()
        .copied()
        .find(|field| field.eq_ignore_ascii_case(key))
}

impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("num_workers", &self.num_workers)
            .field("log_level", &self.log_level)
            .field("dev_mode", &self.dev_mode)
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("ocr_languages", &self.ocr_languages)
            .field("do_code_enrichment", &self.do_code_enrichment)
            .field("do_formula_enrichment", &self.do_formula_enrichment)
            .field("do_picture_classification", &self.do_picture_classification)
            .field("do_picture_description", &self.do_picture_description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<InferenceConfig, ConfigError> {
        InferenceConfig::from_vars(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    // ========== Defaults ==========

    #[test]
    fn defaults_without_overrides() {
        let config = load(&[]).unwrap();

        assert_eq!(config.num_workers, None);
        assert_eq!(config.log_level, "INFO");
        assert!(!config.dev_mode);
        assert_eq!(config.port, 8080);
        assert_eq!(config.auth_token, None);
        assert_eq!(config.ocr_languages, "en,es,fr,de,sv");
        assert!(config.do_code_enrichment);
        assert!(config.do_formula_enrichment);
        assert!(config.do_picture_classification);
        assert!(config.do_picture_description);
        assert_eq!(config.resolved_worker_count(), None);
    }

    // ========== Overrides ==========

    #[test]
    fn environment_overrides_defaults() {
        let config = load(&[
            ("NUM_WORKERS", "4"),
            ("LOG_LEVEL", "DEBUG"),
            ("DEV_MODE", "true"),
            ("PORT", "9000"),
            ("AUTH_TOKEN", "s3cret"),
            ("OCR_LANGUAGES", "en,ja"),
            ("DO_CODE_ENRICHMENT", "false"),
            ("DO_PICTURE_DESCRIPTION", "0"),
        ])
        .unwrap();

        assert_eq!(config.num_workers, Some(4.0));
        assert_eq!(config.log_level, "DEBUG");
        assert!(config.dev_mode);
        assert_eq!(config.port, 9000);
        assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.ocr_languages, "en,ja");
        assert!(!config.do_code_enrichment);
        assert!(config.do_formula_enrichment);
        assert!(config.do_picture_classification);
        assert!(!config.do_picture_description);
        assert_eq!(config.resolved_worker_count(), Some(4));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let lower = load(&[("port", "7000"), ("dev_mode", "yes")]).unwrap();
        let mixed = load(&[("Port", "7000"), ("Dev_Mode", "yes")]).unwrap();

        assert_eq!(lower.port, 7000);
        assert!(lower.dev_mode);
        assert_eq!(mixed.port, 7000);
        assert!(mixed.dev_mode);
    }

    #[test]
    fn upper_case_spelling_wins_regardless_of_order() {
        let upper_first = load(&[("PORT", "1111"), ("port", "2222"), ("Port", "3333")]).unwrap();
        let upper_last = load(&[("port", "2222"), ("Port", "3333"), ("PORT", "1111")]).unwrap();

        assert_eq!(upper_first.port, 1111);
        assert_eq!(upper_last.port, 1111);
    }

    #[test]
    fn mixed_spellings_resolve_deterministically() {
        let a = load(&[("port", "2222"), ("Port", "3333")]).unwrap();
        let b = load(&[("Port", "3333"), ("port", "2222")]).unwrap();

        assert_eq!(a.port, 3333, "Port sorts before port");
        assert_eq!(b.port, 3333);
    }

    #[test]
    fn fractional_and_sentinel_workers_parse() {
        let fraction = load(&[("NUM_WORKERS", "0.5")]).unwrap();
        assert_eq!(fraction.num_workers, Some(0.5));

        let all = load(&[("NUM_WORKERS", "-1")]).unwrap();
        assert_eq!(all.num_workers, Some(-1.0));
        assert_eq!(all.resolved_worker_count(), Some(available_cores() as i64));
    }

    #[test]
    fn numeric_looking_token_is_kept_verbatim() {
        let config = load(&[("AUTH_TOKEN", "007")]).unwrap();
        assert_eq!(config.auth_token.as_deref(), Some("007"));
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        let config = load(&[("PATH", "/usr/bin"), ("RUST_LOG", "trace")]).unwrap();
        assert_eq!(config.log_level, "INFO");
    }

    // ========== Validation Errors ==========

    #[test]
    fn non_numeric_port_names_the_field() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();

        assert!(matches!(err, ConfigError::Load(_)));
        assert!(
            err.to_string().contains("port"),
            "Error should name the offending field, got: {err}"
        );
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(load(&[("PORT", "70000")]).is_err());
    }

    #[test]
    fn non_numeric_workers_is_rejected() {
        assert!(load(&[("NUM_WORKERS", "many")]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_value_names_the_field() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![(OsString::from("PORT"), OsString::from_vec(vec![0xff, 0xfe]))];
        let err = InferenceConfig::from_os_vars(vars).unwrap_err();

        assert!(
            matches!(err, ConfigError::NonUnicode { field: "port" }),
            "Expected NonUnicode for port, got {err:?}"
        );
        assert!(err.to_string().contains("port"));
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_unrelated_values_are_ignored() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("LC_WEIRD"), OsString::from_vec(vec![0xff])),
            (OsString::from_vec(vec![0xff]), OsString::from("x")),
            (OsString::from("PORT"), OsString::from("9100")),
        ];
        let config = InferenceConfig::from_os_vars(vars).unwrap();

        assert_eq!(config.port, 9100);
    }

    // ========== Helpers ==========

    #[test]
    fn debug_redacts_auth_token() {
        let config = load(&[("AUTH_TOKEN", "hunter2")]).unwrap();
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("hunter2"), "Token leaked: {rendered}");
        assert!(rendered.contains("***"));
    }

    #[test]
    fn ocr_language_list_splits_and_trims() {
        let config = load(&[]).unwrap();
        assert_eq!(config.ocr_language_list(), vec!["en", "es", "fr", "de", "sv"]);

        let config = load(&[("OCR_LANGUAGES", " en, ,de ,")]).unwrap();
        assert_eq!(config.ocr_language_list(), vec!["en", "de"]);
    }
}
