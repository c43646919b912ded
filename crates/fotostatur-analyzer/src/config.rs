//! Analyzer configuration.

use std::str::FromStr;
use std::time::Duration;

use fotostatur_media::ResizeMode;
use fotostatur_models::ImageReference;
use fotostatur_publish::OAuthCredentials;
use fotostatur_storage::S3Location;

use crate::detectors::AttributeSelector;
use crate::error::{AnalyzerError, AnalyzerResult};

/// Accept/reject threshold, fixed for the lifetime of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionConfig {
    /// A run is accepted only when its score is strictly above this value
    pub threshold: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self { threshold: 51.0 }
    }
}

/// What the dispatcher does with an accepted image.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Transform box width in pixels
    pub width: u32,
    /// Transform box height in pixels
    pub height: u32,
    /// Stretch to the box or fit inside it
    pub resize_mode: ResizeMode,
    /// Upload the transformed image before publishing
    pub persist_transformed: bool,
    /// Bucket for transformed images (defaults to the source bucket)
    pub output_bucket: Option<String>,
    /// Key prefix for transformed images
    pub output_prefix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            resize_mode: ResizeMode::Exact,
            persist_transformed: false,
            output_bucket: None,
            output_prefix: "resized".to_string(),
        }
    }
}

impl DispatchConfig {
    /// Where the transformed version of `image` is persisted.
    pub fn output_location(&self, image: &ImageReference) -> ImageReference {
        let bucket = self
            .output_bucket
            .clone()
            .unwrap_or_else(|| image.bucket.clone());
        let file_name = format!("resize_{}", image.file_name());
        let prefix = self.output_prefix.trim_matches('/');
        let key = if prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", prefix, file_name)
        };
        ImageReference::new(bucket, key)
    }
}

/// Analyzer service configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub decision: DecisionConfig,
    /// Reference image the face comparison targets
    pub headshot: ImageReference,
    /// Facial attributes to score
    pub face_attributes: Vec<AttributeSelector>,
    /// Publishing account credentials
    pub credentials: OAuthCredentials,
    pub dispatch: DispatchConfig,
    /// Deadline for a single image run
    pub run_timeout: Duration,
    /// Maximum runs in flight per event
    pub max_concurrent_runs: usize,
    /// HTTP bind host
    pub host: String,
    /// HTTP bind port
    pub port: u16,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl AnalyzerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> AnalyzerResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> AnalyzerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AnalyzerError::config_error(format!("{} is required", name)))
        };

        let photos = S3Location::parse(&required("HEADSHOT_PHOTOS")?)
            .map_err(|e| AnalyzerError::config_error(format!("HEADSHOT_PHOTOS: {}", e)))?;
        let headshot_file = required("HEADSHOT_FILE_NAME")?;
        let headshot = ImageReference::new(photos.bucket.clone(), photos.key_for(&headshot_file));

        let face_attributes = match lookup("FACE_ATTRIBUTES") {
            Some(value) => AttributeSelector::parse_list(&value)
                .map_err(|e| AnalyzerError::config_error(format!("FACE_ATTRIBUTES: {}", e)))?,
            None => vec![AttributeSelector::default()],
        };

        let credentials = OAuthCredentials::new(
            required("TWITTER_CONSUMER_KEY")?,
            required("TWITTER_CONSUMER_SECRET")?,
            required("TWITTER_ACCESS_TOKEN")?,
            required("TWITTER_ACCESS_SECRET")?,
        );

        let defaults = DispatchConfig::default();
        let resize_mode = match lookup("RESIZE_MODE") {
            Some(value) => value
                .parse::<ResizeMode>()
                .map_err(|e| AnalyzerError::config_error(format!("RESIZE_MODE: {}", e)))?,
            None => defaults.resize_mode,
        };
        let dispatch = DispatchConfig {
            width: parse_var(&lookup, "RESIZE_WIDTH").unwrap_or(defaults.width),
            height: parse_var(&lookup, "RESIZE_HEIGHT").unwrap_or(defaults.height),
            resize_mode,
            persist_transformed: lookup("PERSIST_TRANSFORMED")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            output_bucket: lookup("OUTPUT_BUCKET").filter(|v| !v.trim().is_empty()),
            output_prefix: lookup("OUTPUT_PREFIX").unwrap_or(defaults.output_prefix),
        };

        let threshold = match lookup("CRITERIA_THRESHOLD") {
            Some(value) => f64::from_str(value.trim()).map_err(|e| {
                AnalyzerError::config_error(format!("CRITERIA_THRESHOLD '{}': {}", value, e))
            })?,
            None => DecisionConfig::default().threshold,
        };

        Ok(Self {
            decision: DecisionConfig { threshold },
            headshot,
            face_attributes,
            credentials,
            dispatch,
            run_timeout: Duration::from_secs(parse_var(&lookup, "RUN_TIMEOUT_SECS").unwrap_or(60)),
            max_concurrent_runs: parse_var::<usize, _>(&lookup, "MAX_CONCURRENT_RUNS")
                .unwrap_or(4)
                .max(1),
            host: lookup("ANALYZER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "ANALYZER_PORT").unwrap_or(8080),
            metrics_enabled: lookup("METRICS_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|s| s.trim().parse().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("HEADSHOT_PHOTOS", "s3://reference-photos/headshots"),
            ("HEADSHOT_FILE_NAME", "me.jpg"),
            ("TWITTER_CONSUMER_KEY", "ck"),
            ("TWITTER_CONSUMER_SECRET", "cs"),
            ("TWITTER_ACCESS_TOKEN", "at"),
            ("TWITTER_ACCESS_SECRET", "as"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> AnalyzerResult<AnalyzerConfig> {
        AnalyzerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.decision.threshold, 51.0);
        assert_eq!(
            config.headshot,
            ImageReference::new("reference-photos", "headshots/me.jpg")
        );
        assert_eq!(config.face_attributes, vec![AttributeSelector::any("mustache")]);
        assert_eq!(config.dispatch, DispatchConfig::default());
        assert_eq!(config.run_timeout, Duration::from_secs(60));
        assert_eq!(config.max_concurrent_runs, 4);
        assert_eq!(config.port, 8080);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("CRITERIA_THRESHOLD", "75.5");
        vars.insert("FACE_ATTRIBUTES", "beard!,smile");
        vars.insert("RESIZE_WIDTH", "200");
        vars.insert("RESIZE_MODE", "fit");
        vars.insert("PERSIST_TRANSFORMED", "true");
        vars.insert("OUTPUT_BUCKET", "published");
        vars.insert("MAX_CONCURRENT_RUNS", "0");

        let config = load(&vars).unwrap();
        assert_eq!(config.decision.threshold, 75.5);
        assert_eq!(config.face_attributes[0], AttributeSelector::present("beard"));
        assert_eq!(config.dispatch.width, 200);
        assert_eq!(config.dispatch.height, 400);
        assert_eq!(config.dispatch.resize_mode, ResizeMode::Fit);
        assert!(config.dispatch.persist_transformed);
        assert_eq!(config.dispatch.output_bucket.as_deref(), Some("published"));
        assert_eq!(config.max_concurrent_runs, 1);
    }

    #[test]
    fn test_missing_required_variable() {
        let mut vars = base_vars();
        vars.remove("TWITTER_ACCESS_SECRET");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("TWITTER_ACCESS_SECRET"));

        let mut vars = base_vars();
        vars.insert("HEADSHOT_FILE_NAME", "  ");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut vars = base_vars();
        vars.insert("CRITERIA_THRESHOLD", "high");
        assert!(matches!(load(&vars), Err(AnalyzerError::ConfigError(_))));
    }

    #[test]
    fn test_unknown_resize_mode_rejected() {
        let mut vars = base_vars();
        vars.insert("RESIZE_MODE", "crop");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("RESIZE_MODE"));
    }

    #[test]
    fn test_output_location() {
        let image = ImageReference::new("uploads", "2024/cat.jpg");

        let config = DispatchConfig::default();
        assert_eq!(
            config.output_location(&image),
            ImageReference::new("uploads", "resized/resize_cat.jpg")
        );

        let config = DispatchConfig {
            output_bucket: Some("public".to_string()),
            output_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(
            config.output_location(&image),
            ImageReference::new("public", "resize_cat.jpg")
        );
    }
}
