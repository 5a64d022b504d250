use async_trait::async_trait;
use atelier_common::{EditorError, EditorResult};
use atelier_editor::{Translation, TranslationRequest, Translator};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Translator that prefixes copy with the target locale.
///
/// A title that was already translated answers 409, like the real service
/// does for records it has seen before.
#[derive(Debug)]
pub struct PrefixTranslator {
    locales: Vec<String>,
    seen: Mutex<BTreeSet<String>>,
}

impl PrefixTranslator {
    pub fn new<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
            seen: Mutex::new(BTreeSet::new()),
        }
    }
}

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate(
        &self,
        request: TranslationRequest,
    ) -> EditorResult<BTreeMap<String, Translation>> {
        let first_time = self
            .seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(request.title.clone());
        if !first_time {
            return Err(EditorError::from_api_response(
                409,
                r#"{"message":"This record has already been translated"}"#,
            ));
        }

        // The source locale comes back untouched
        let mut out = BTreeMap::new();
        out.insert(
            request.source_locale.clone(),
            Translation {
                title: request.title.clone(),
                description: request.description.clone(),
                tags: request.tags.clone(),
            },
        );
        for locale in &self.locales {
            out.insert(
                locale.clone(),
                Translation {
                    title: format!("[{}] {}", locale, request.title),
                    description: format!("[{}] {}", locale, request.description),
                    tags: request.tags.clone(),
                },
            );
        }
        Ok(out)
    }
}
