// src/site_parser/form_classifier.rs
use crate::config::FormKeywords;
use crate::scorer::FormScorer;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

const FORM_HTML_LIMIT: usize = 2000;
const SURROUNDING_TEXT_LIMIT: usize = 300;
const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Field-text terms that add weight outside the structured keyword lists.
const EXTRA_FIELD_TERMS: [&str; 3] = ["contact", "phone", "subject"];

/// The external scorer only runs when the heuristic score is ambiguous,
/// i.e. inside this inclusive range.
const AMBIGUOUS_RANGE: std::ops::RangeInclusive<i32> = 2..=8;

/// Signals pulled out of one `<form>` element. Extraction is synchronous so
/// the parsed DOM never has to live across an await point; only these owned
/// strings do.
#[derive(Debug, Clone)]
pub struct FormSignals {
    /// Lowercased form text + action + class + id, space-joined.
    pub context: String,
    pub fields: Vec<FieldSignals>,
    /// Serialized form element, for the external scorer.
    pub html: String,
    /// Text of the parent element, for the external scorer.
    pub surrounding: String,
}

#[derive(Debug, Clone)]
pub struct FieldSignals {
    /// Lowercased name + placeholder + id.
    pub text: String,
    pub is_email_type: bool,
    pub is_textarea: bool,
}

/// Extract scoring signals for every form on the page.
pub fn collect_form_signals(document: &Html) -> Vec<FormSignals> {
    let form_selector = Selector::parse("form").unwrap();
    let field_selector = Selector::parse("input, textarea, select").unwrap();

    document
        .select(&form_selector)
        .map(|form| {
            let element = form.value();
            let text = form.text().collect::<Vec<_>>().join(" ").to_lowercase();
            let action = element.attr("action").unwrap_or("").to_lowercase();
            let class = element.attr("class").unwrap_or("").to_lowercase();
            let id = element.attr("id").unwrap_or("").to_lowercase();

            let fields = form
                .select(&field_selector)
                .map(|field| {
                    let value = field.value();
                    let name = value.attr("name").unwrap_or("");
                    let placeholder = value.attr("placeholder").unwrap_or("");
                    let field_id = value.attr("id").unwrap_or("");
                    FieldSignals {
                        text: format!("{} {} {}", name, placeholder, field_id).to_lowercase(),
                        is_email_type: value
                            .attr("type")
                            .map(|t| t.eq_ignore_ascii_case("email"))
                            .unwrap_or(false),
                        is_textarea: value.name() == "textarea",
                    }
                })
                .collect();

            FormSignals {
                context: format!("{} {} {} {}", text, action, class, id),
                fields,
                html: form.html(),
                surrounding: parent_text(&form),
            }
        })
        .collect()
}

fn parent_text(form: &ElementRef) -> String {
    form.parent()
        .and_then(ElementRef::wrap)
        .map(|parent| {
            parent
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

pub struct FormClassifier {
    keywords: FormKeywords,
    threshold: i32,
}

impl FormClassifier {
    pub fn new(keywords: FormKeywords, threshold: i32) -> Self {
        Self { keywords, threshold }
    }

    /// A page counts as a contact-form page as soon as one form qualifies;
    /// remaining forms are not scored.
    pub async fn page_has_contact_form(
        &self,
        forms: &[FormSignals],
        scorer: Option<&dyn FormScorer>,
    ) -> bool {
        for form in forms {
            if self.is_contact_form(form, scorer).await {
                return true;
            }
        }
        false
    }

    async fn is_contact_form(&self, form: &FormSignals, scorer: Option<&dyn FormScorer>) -> bool {
        let mut score = self.heuristic_score(form);

        if let Some(scorer) = scorer {
            if AMBIGUOUS_RANGE.contains(&score) {
                let delta = self.scored_delta(scorer, form).await;
                debug!("ambiguous form score {}, scorer delta {}", score, delta);
                score += delta;
            }
        }

        score >= self.threshold
    }

    /// Accumulate the keyword/field score for one form. No single signal is
    /// decisive; the threshold decision happens on the sum.
    pub fn heuristic_score(&self, form: &FormSignals) -> i32 {
        let mut score = 0;

        for keyword in &self.keywords.attributes {
            if form.context.contains(keyword.as_str()) {
                score += 2;
            }
        }
        for phrase in &self.keywords.surrounding_text {
            if form.context.contains(phrase.as_str()) {
                score += 3;
            }
        }

        let mut has_email_field = false;
        let mut has_message_field = false;
        let mut has_name_field = false;

        for field in &form.fields {
            // First matching sub-keyword per category counts once per field;
            // several fields can still score the same category independently.
            if field.is_email_type
                || self
                    .keywords
                    .email_fields
                    .iter()
                    .any(|k| field.text.contains(k.as_str()))
            {
                has_email_field = true;
                score += 4;
            }

            if field.is_textarea
                || self
                    .keywords
                    .message_fields
                    .iter()
                    .any(|k| field.text.contains(k.as_str()))
            {
                has_message_field = true;
                score += 3;
            }

            if self
                .keywords
                .name_fields
                .iter()
                .any(|k| field.text.contains(k.as_str()))
            {
                has_name_field = true;
                score += 2;
            }

            if EXTRA_FIELD_TERMS.iter().any(|k| field.text.contains(k)) {
                score += 2;
            }
        }

        if has_email_field && has_message_field {
            score += 3;
        }
        if has_email_field && has_name_field {
            score += 2;
        }

        score
    }

    async fn scored_delta(&self, scorer: &dyn FormScorer, form: &FormSignals) -> i32 {
        let html = truncate_chars(&form.html, FORM_HTML_LIMIT, TRUNCATION_MARKER);
        let surrounding = truncate_chars(&form.surrounding, SURROUNDING_TEXT_LIMIT, "");

        match scorer.score(&html, &surrounding).await {
            Ok(verdict) => verdict_delta(verdict),
            Err(e) => {
                warn!("form scoring failed, treating as neutral: {}", e);
                0
            }
        }
    }
}

/// Map a scorer verdict onto a score delta. Anything outside the known
/// verdict set is neutral.
fn verdict_delta(verdict: i32) -> i32 {
    match verdict {
        -2 => -5,
        -1 => -2,
        1 => 2,
        2 => 5,
        _ => 0,
    }
}

fn truncate_chars(text: &str, limit: usize, marker: &str) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str(marker);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubScorer {
        verdict: std::result::Result<i32, String>,
        calls: AtomicUsize,
        last_html: Mutex<String>,
    }

    impl StubScorer {
        fn new(verdict: std::result::Result<i32, String>) -> Self {
            Self {
                verdict,
                calls: AtomicUsize::new(0),
                last_html: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl FormScorer for StubScorer {
        async fn score(&self, form_html: &str, _surrounding: &str) -> Result<i32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_html.lock().unwrap() = form_html.to_string();
            match &self.verdict {
                Ok(v) => Ok(*v),
                Err(e) => Err(e.clone().into()),
            }
        }
    }

    fn classifier() -> FormClassifier {
        FormClassifier::new(FormKeywords::default(), 5)
    }

    fn signals(html: &str) -> Vec<FormSignals> {
        collect_form_signals(&Html::parse_document(html))
    }

    // Scores 4 (email) + 3 (textarea) + 3 (combo) = 10: a clear contact form,
    // outside the ambiguous range.
    const CONTACT_FORM: &str = r#"
        <div><p>Get in touch</p>
        <form action="/send">
            <input type="email" name="email">
            <textarea name="message"></textarea>
        </form></div>
    "#;

    // Scores 3 (textarea) + 2 (name field) = 5: clears the threshold but sits
    // inside the ambiguous range, so a configured scorer gets the last word.
    const AMBIGUOUS_FORM: &str = r#"
        <div><form>
            <input name="fname">
            <textarea name="comment"></textarea>
        </form></div>
    "#;

    #[test]
    fn email_plus_textarea_scores_at_least_seven() {
        let forms = signals(CONTACT_FORM);
        let score = classifier().heuristic_score(&forms[0]);
        // +4 email, +3 textarea/message, +3 combo
        assert!(score >= 7, "score was {score}");
    }

    #[test]
    fn adding_email_field_never_decreases_score() {
        let without = signals(r#"<form><textarea name="message"></textarea></form>"#);
        let with = signals(
            r#"<form><textarea name="message"></textarea><input type="email" name="email"></form>"#,
        );
        let c = classifier();
        assert!(c.heuristic_score(&with[0]) >= c.heuristic_score(&without[0]));
    }

    #[test]
    fn unrelated_form_scores_low() {
        let forms = signals(r#"<form action="/search"><input type="text" name="q"></form>"#);
        assert!(classifier().heuristic_score(&forms[0]) < 5);
    }

    #[test]
    fn first_matching_subkeyword_counts_once_per_field() {
        // "email e-mail" matches two email sub-keywords but the field scores
        // +4 only once
        let forms = signals(r#"<form><input name="email" placeholder="e-mail"></form>"#);
        let score = classifier().heuristic_score(&forms[0]);
        let single = signals(r#"<form><input name="email"></form>"#);
        assert_eq!(score, classifier().heuristic_score(&single[0]));
    }

    #[tokio::test]
    async fn scorer_fires_inside_ambiguous_range() {
        let forms = signals(AMBIGUOUS_FORM);
        let c = classifier();
        let score = c.heuristic_score(&forms[0]);
        assert!(AMBIGUOUS_RANGE.contains(&score), "score {score} not ambiguous");

        let scorer = StubScorer::new(Ok(2));
        assert!(c.page_has_contact_form(&forms, Some(&scorer)).await);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scorer_not_called_outside_ambiguous_range() {
        let c = classifier();
        let scorer = StubScorer::new(Ok(2));

        // Clearly a contact form: accepted without consulting the scorer
        let clear = signals(CONTACT_FORM);
        assert!(c.page_has_contact_form(&clear, Some(&scorer)).await);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);

        // Clearly not one: rejected without consulting the scorer
        let search = signals(r#"<form action="/search"><input name="q"></form>"#);
        assert!(!c.page_has_contact_form(&search, Some(&scorer)).await);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn negative_verdict_can_reject_an_ambiguous_form() {
        let forms = signals(AMBIGUOUS_FORM);
        let c = classifier();
        // without a scorer the heuristic score of 5 clears the threshold
        assert!(c.page_has_contact_form(&forms, None).await);
        // a -2 verdict subtracts 5 and drops it below the threshold
        let scorer = StubScorer::new(Ok(-2));
        assert!(!c.page_has_contact_form(&forms, Some(&scorer)).await);
    }

    #[tokio::test]
    async fn scorer_failure_is_neutral() {
        let forms = signals(AMBIGUOUS_FORM);
        let scorer = StubScorer::new(Err("network down".to_string()));
        // neutral delta keeps the heuristic score of 5, which still clears
        // the threshold
        assert!(classifier().page_has_contact_form(&forms, Some(&scorer)).await);
    }

    #[tokio::test]
    async fn long_form_html_is_truncated_with_marker() {
        let filler = "x".repeat(4000);
        let html = format!(r#"<form><textarea name="comment">{filler}</textarea></form>"#);
        let forms = signals(&html);
        let scorer = StubScorer::new(Ok(0));
        classifier().page_has_contact_form(&forms, Some(&scorer)).await;

        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
        let sent = scorer.last_html.lock().unwrap().clone();
        assert!(sent.ends_with(TRUNCATION_MARKER));
        assert!(sent.chars().count() <= FORM_HTML_LIMIT + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn verdict_map_matches_table() {
        assert_eq!(verdict_delta(-2), -5);
        assert_eq!(verdict_delta(-1), -2);
        assert_eq!(verdict_delta(0), 0);
        assert_eq!(verdict_delta(1), 2);
        assert_eq!(verdict_delta(2), 5);
        assert_eq!(verdict_delta(42), 0);
    }
}
