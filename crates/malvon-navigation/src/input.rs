//! Input resolution for address bar
//!
//! Raw input is classified, dispatched to the matching handler and
//! normalized into a URL the content loader can open. Resolution never
//! fails: every error is logged and replaced by the fallback URL.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::sync::Arc;

use crate::canonical::CanonicalUrl;
use crate::context::BrowsingContext;
use crate::error::NavigationError;
use crate::normalize::Normalizer;
use crate::query::{classify, ClassifiedQuery};
use crate::resources::{NoBundledResources, ResourceBundle};
use crate::visits::VisitSink;
use crate::Result;

pub const DEFAULT_SEARCH_TEMPLATE: &str = "https://www.google.com/search?client=Malvon&q=%s";
pub const DEFAULT_FALLBACK_URL: &str = "https://www.apple.com";

/// Characters allowed unescaped in a URL host: alphanumerics and
/// `! $ & ' ( ) * + , - . : ; = [ ] _ ~`.
const HOST_ALLOWED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b'-')
    .remove(b'.')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'[')
    .remove(b']')
    .remove(b'_')
    .remove(b'~');

pub struct InputResolver {
    /// Search engine URL template (%s replaced with query)
    search_template: String,
    normalizer: Normalizer,
    resources: Arc<dyn ResourceBundle>,
    visits: Option<Arc<dyn VisitSink>>,
}

impl InputResolver {
    pub fn new() -> Self {
        Self {
            search_template: DEFAULT_SEARCH_TEMPLATE.to_string(),
            normalizer: Normalizer::default(),
            resources: Arc::new(NoBundledResources),
            visits: None,
        }
    }

    pub fn with_search_engine(template: String) -> Result<Self> {
        let mut resolver = Self::new();
        resolver.set_search_engine(template)?;
        Ok(resolver)
    }

    pub fn with_fallback(mut self, fallback: CanonicalUrl) -> Result<Self> {
        self.set_fallback(fallback)?;
        Ok(self)
    }

    pub fn with_resources(mut self, resources: Arc<dyn ResourceBundle>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_visit_sink(mut self, visits: Arc<dyn VisitSink>) -> Self {
        self.visits = Some(visits);
        self
    }

    pub fn set_search_engine(&mut self, template: String) -> Result<()> {
        validate_search_template(&template)?;
        self.search_template = template;
        Ok(())
    }

    pub fn search_template(&self) -> &str {
        &self.search_template
    }

    /// The fallback must be a complete URL so that normalizing it is a no-op.
    pub fn set_fallback(&mut self, fallback: CanonicalUrl) -> Result<()> {
        if !fallback.has_scheme_and_host() {
            return Err(NavigationError::MalformedUrl(format!(
                "fallback URL {} needs a scheme and host",
                fallback
            )));
        }
        self.normalizer = Normalizer::new(fallback);
        Ok(())
    }

    pub fn fallback(&self) -> &CanonicalUrl {
        self.normalizer.fallback()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Resolve user input into the URL to load.
    ///
    /// `context` is the active profile; visits are only recorded for
    /// direct URLs typed into a non-private context.
    pub fn resolve(&self, input: &str, context: Option<&dyn BrowsingContext>) -> CanonicalUrl {
        match self.try_resolve(input, context) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(input = %input, error = %e, "Address bar input fell back");
                self.fallback().clone()
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but reports why no URL could be
    /// produced instead of substituting the fallback.
    pub fn try_resolve(
        &self,
        input: &str,
        context: Option<&dyn BrowsingContext>,
    ) -> Result<CanonicalUrl> {
        let query = classify(input);
        tracing::debug!(?query, "Classified address bar input");

        match query {
            ClassifiedQuery::InternalCommand { path } => self.resolve_internal(&path),
            ClassifiedQuery::FileReference { path } => CanonicalUrl::parse(&path),
            ClassifiedQuery::DirectUrl { raw } => {
                let url = CanonicalUrl::parse(&raw)?;
                self.record_visit(raw, context);
                Ok(self.normalizer.normalize(url))
            }
            ClassifiedQuery::SearchTerm { text } => {
                let url = self.build_search_url(&text)?;
                Ok(self.normalizer.normalize(url))
            }
        }
    }

    fn resolve_internal(&self, name: &str) -> Result<CanonicalUrl> {
        self.resources
            .lookup(name)
            .ok_or_else(|| NavigationError::ResourceNotFound(name.to_string()))
    }

    fn record_visit(&self, raw: String, context: Option<&dyn BrowsingContext>) {
        let Some(context) = context else {
            return;
        };

        if context.is_private() {
            tracing::debug!("Private context, not recording visit");
            return;
        }

        if let Some(visits) = &self.visits {
            visits.submit(raw);
        }
    }

    /// Build search URL from query
    fn build_search_url(&self, term: &str) -> Result<CanonicalUrl> {
        let encoded = utf8_percent_encode(term, HOST_ALLOWED).to_string();
        let search_url = self.search_template.replace("%s", &encoded);

        CanonicalUrl::parse(&search_url).map_err(|e| {
            NavigationError::Encoding(format!("{:?} produced an invalid URL: {}", term, e))
        })
    }
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_search_template(template: &str) -> Result<()> {
    if !template.contains("%s") {
        return Err(NavigationError::InvalidSearchTemplate(format!(
            "{} has no %s placeholder",
            template
        )));
    }

    let sample = CanonicalUrl::parse(&template.replace("%s", "test"))
        .map_err(|e| NavigationError::InvalidSearchTemplate(e.to_string()))?;

    if !sample.has_scheme_and_host() {
        return Err(NavigationError::InvalidSearchTemplate(format!(
            "{} is not an absolute URL",
            template
        )));
    }

    Ok(())
}
