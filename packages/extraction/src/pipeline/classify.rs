//! Content quality classification.
//!
//! Decides whether fetched content is worth a paid extraction call. Pure:
//! no I/O, and the same content and config always give the same verdict.
//!
//! Rules, first match wins:
//! 1. not-found status code, or a not-found marker in the body or title
//! 2. trimmed length below `min_length` -> `invalid`
//! 3. fewer than `min_indicators` indicator matches -> `poor`
//! 4. otherwise -> `good`

use regex::{Regex, RegexBuilder};

use crate::error::{ConfigError, ConfigResult};
use crate::types::config::ClassifierConfig;
use crate::types::content::RawContent;
use crate::types::quality::{QualitySignal, QualityVerdict, VerdictKind};

/// Grades raw content as good, poor, invalid, or not found.
#[derive(Debug, Clone)]
pub struct QualityClassifier {
    config: ClassifierConfig,
    indicators: Vec<(String, Regex)>,
    not_found_markers: Vec<(String, Regex)>,
    title_markers: Vec<(String, Regex)>,
}

impl QualityClassifier {
    /// Compile the configured patterns.
    pub fn new(config: ClassifierConfig) -> ConfigResult<Self> {
        if config.length_saturation == 0 {
            return Err(ConfigError::Invalid(
                "length_saturation must be greater than zero".into(),
            ));
        }
        if config.length_weight < 0.0 || config.indicator_weight < 0.0 {
            return Err(ConfigError::Invalid(
                "classifier weights must be non-negative".into(),
            ));
        }

        Ok(Self {
            indicators: compile(&config.indicators, false)?,
            not_found_markers: compile(&config.not_found_markers, true)?,
            title_markers: compile(&config.title_markers, false)?,
            config,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify fetched content. The fetch status travels on
    /// `content.status_code`.
    pub fn classify(&self, content: &RawContent) -> QualityVerdict {
        let mut signals = Vec::new();

        if let Some(code) = content.status_code {
            let not_found = self.config.not_found_status_codes.contains(&code);
            signals.push(QualitySignal::StatusCode { code, not_found });
            if not_found {
                return QualityVerdict::new(
                    VerdictKind::NotFound,
                    0.0,
                    signals,
                    format!("fetch returned status {}", code),
                );
            }
        }

        if let Some(pattern) = first_match(&self.not_found_markers, &content.content) {
            signals.push(QualitySignal::NotFoundMarker {
                pattern: pattern.to_string(),
                in_title: false,
            });
            return QualityVerdict::new(
                VerdictKind::NotFound,
                0.0,
                signals,
                format!("not-found marker in content: {}", pattern),
            );
        }

        if let Some(title) = content.title.as_deref() {
            if let Some(pattern) = first_match(&self.title_markers, title) {
                signals.push(QualitySignal::NotFoundMarker {
                    pattern: pattern.to_string(),
                    in_title: true,
                });
                return QualityVerdict::new(
                    VerdictKind::NotFound,
                    0.0,
                    signals,
                    format!("not-found marker in title: {}", title),
                );
            }
        }

        let chars = content.char_len();
        let length_ok = chars >= self.config.min_length;
        signals.push(QualitySignal::Length {
            chars,
            minimum: self.config.min_length,
            passed: length_ok,
        });
        if !length_ok {
            return QualityVerdict::new(
                VerdictKind::Invalid,
                0.0,
                signals,
                format!(
                    "content too short: {} chars (minimum {})",
                    chars, self.config.min_length
                ),
            );
        }

        let matched: Vec<String> = self
            .indicators
            .iter()
            .filter(|(_, re)| re.is_match(&content.content))
            .map(|(pattern, _)| pattern.clone())
            .collect();
        let found = matched.len();
        let indicators_ok = found >= self.config.min_indicators;
        let score = self.score(chars, found);

        signals.push(QualitySignal::Indicators {
            found,
            total: self.indicators.len(),
            minimum: self.config.min_indicators,
            matched,
            passed: indicators_ok,
        });

        if !indicators_ok {
            return QualityVerdict::new(
                VerdictKind::Poor,
                score,
                signals,
                format!(
                    "only {} domain indicators found (minimum {})",
                    found, self.config.min_indicators
                ),
            );
        }

        QualityVerdict::new(
            VerdictKind::Good,
            score,
            signals,
            format!("{} domain indicators, {} chars", found, chars),
        )
    }

    fn score(&self, chars: usize, found: usize) -> f64 {
        let length = (chars as f64 / self.config.length_saturation as f64).min(1.0);
        let ratio = if self.indicators.is_empty() {
            0.0
        } else {
            found as f64 / self.indicators.len() as f64
        };
        (self.config.length_weight * length + self.config.indicator_weight * ratio).clamp(0.0, 1.0)
    }
}

/// Body markers span lines, so `dot_all` lets `.` match `\n` there.
fn compile(patterns: &[String], dot_all: bool) -> ConfigResult<Vec<(String, Regex)>> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .dot_matches_new_line(dot_all)
                .build()
                .map(|re| (pattern.clone(), re))
                .map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}

fn first_match<'a>(patterns: &'a [(String, Regex)], text: &str) -> Option<&'a str> {
    patterns
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(pattern, _)| pattern.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn jobs() -> QualityClassifier {
        QualityClassifier::new(ClassifierConfig::for_jobs()).unwrap()
    }

    fn job_page() -> String {
        let mut text = String::from(
            "Senior Engineer\n\nResponsibilities: build services.\n\
             Requirements: five years of experience.\nBenefits: health, dental.\n",
        );
        while text.chars().count() < 800 {
            text.push_str("We build reliable software for small businesses. ");
        }
        text
    }

    #[test]
    fn empty_content_is_invalid() {
        let verdict = jobs().classify(&RawContent::new("https://example.com", ""));
        assert_eq!(verdict.kind, VerdictKind::Invalid);
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn whitespace_only_is_invalid() {
        let verdict = jobs().classify(&RawContent::new("https://example.com", "   \n\n\t"));
        assert_eq!(verdict.kind, VerdictKind::Invalid);
    }

    #[test]
    fn status_404_wins_over_good_content() {
        let content = RawContent::new("https://example.com", job_page()).with_status_code(404);
        let verdict = jobs().classify(&content);
        assert_eq!(verdict.kind, VerdictKind::NotFound);
        assert!(matches!(
            verdict.signals[0],
            QualitySignal::StatusCode { code: 404, not_found: true }
        ));
    }

    #[test]
    fn status_200_is_recorded_but_ignored() {
        let content = RawContent::new("https://example.com", job_page()).with_status_code(200);
        let verdict = jobs().classify(&content);
        assert_eq!(verdict.kind, VerdictKind::Good);
    }

    #[test]
    fn body_marker_means_not_found() {
        let content = RawContent::new(
            "https://jobs.lever.co/acme/123",
            format!("{}\nSorry, we couldn't find that job.", job_page()),
        );
        assert_eq!(jobs().classify(&content).kind, VerdictKind::NotFound);
    }

    #[test]
    fn body_marker_matches_across_lines() {
        let content = RawContent::new("https://example.com/jobs/9", "# 404\n\nError");
        let verdict = jobs().classify(&content);
        assert_eq!(verdict.kind, VerdictKind::NotFound);

        let content = RawContent::new(
            "https://jobs.lever.co/acme/123",
            format!("{}\nPage\nnot\nfound", job_page()),
        );
        assert_eq!(jobs().classify(&content).kind, VerdictKind::NotFound);
    }

    #[test]
    fn title_marker_means_not_found() {
        let content = RawContent::new("https://example.com", job_page()).with_title("404 | Acme");
        let verdict = jobs().classify(&content);
        assert_eq!(verdict.kind, VerdictKind::NotFound);
        assert!(verdict.reason.contains("title"));
    }

    #[test]
    fn long_content_without_indicators_is_poor() {
        let text = "Lorem ipsum dolor sit amet. ".repeat(40);
        let verdict = jobs().classify(&RawContent::new("https://example.com", text));
        assert_eq!(verdict.kind, VerdictKind::Poor);
        assert!(verdict.score > 0.0);
    }

    #[test]
    fn good_job_page() {
        let verdict = jobs().classify(&RawContent::new("https://example.com", job_page()));
        assert_eq!(verdict.kind, VerdictKind::Good);
        assert!(verdict.score > 0.5 && verdict.score <= 1.0);
    }

    #[test]
    fn form_profile_detects_closed_form() {
        let classifier = QualityClassifier::new(ClassifierConfig::for_forms()).unwrap();
        let text = format!(
            "{}\nThis form is no longer accepting responses.",
            "Volunteer form question required ".repeat(30)
        );
        let verdict = classifier.classify(&RawContent::new("https://forms.gle/abc", text));
        assert_eq!(verdict.kind, VerdictKind::NotFound);
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let config = ClassifierConfig::for_jobs().with_indicators(["(unclosed"]);
        assert!(matches!(
            QualityClassifier::new(config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    proptest! {
        #[test]
        fn short_content_is_always_invalid(text in "[xyz ]{0,499}") {
            let mut padded = String::from("responsibilities requirements salary ");
            padded.push_str(&text);
            let classifier = QualityClassifier::new(
                ClassifierConfig::for_jobs().with_min_length(padded.trim().chars().count() + 1),
            )
            .unwrap();
            let verdict = classifier.classify(&RawContent::new("https://example.com", padded));
            prop_assert_eq!(verdict.kind, VerdictKind::Invalid);
        }

        #[test]
        fn not_found_status_always_wins(text in "[a-z ]{0,2000}", code in prop::sample::select(vec![404u16, 410])) {
            let content = RawContent::new("https://example.com", text).with_status_code(code);
            prop_assert_eq!(jobs().classify(&content).kind, VerdictKind::NotFound);
        }

        #[test]
        fn score_stays_in_unit_interval(text in "\\PC{0,3000}") {
            let verdict = jobs().classify(&RawContent::new("https://example.com", text));
            prop_assert!((0.0..=1.0).contains(&verdict.score));
        }
    }
}
