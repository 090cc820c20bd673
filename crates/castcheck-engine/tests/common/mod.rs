#![allow(dead_code)]

//! In-memory browser for driving page objects without Chrome.
//!
//! Nodes declare the selector strings they satisfy instead of carrying real
//! markup; a locator step matches a node when the node lists the step's CSS
//! verbatim.

use async_trait::async_trait;
use castcheck_common::config::{Properties, SuiteConfig};
use castcheck_common::{Driver, DriverError, LaunchOptions, Locator, NavigationResult};
use castcheck_engine::pages::PageTiming;
use std::collections::HashMap;
use url::Url;

pub const BASE_URL: &str = "https://fake.test/";

pub const FAST_PROPERTIES: &str = "\
imdb.base.url=https://fake.test/
search.term.qa=QA
cast.min.count=3
cast.member.index=3
dropdown.wait=20
page.load.wait=20
browser.timeout=20
browser.polling.interval=1
";

pub fn fast_config() -> SuiteConfig {
    SuiteConfig::from_properties(&Properties::parse(FAST_PROPERTIES)).unwrap()
}

pub fn fast_timing() -> PageTiming {
    PageTiming::from_config(&fast_config())
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub selectors: Vec<String>,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub hidden: bool,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    fn matches(&self, css: &str) -> bool {
        self.selectors.iter().any(|s| s == css)
    }
}

fn find_all(nodes: &[Node], css: &str, out: &mut Vec<Node>) {
    for node in nodes {
        if node.matches(css) {
            out.push(node.clone());
        }
        find_all(&node.children, css, out);
    }
}

/// Title page using the current `title-cast-item` markup.
pub fn title_page(title: &str, cast: &[(&str, &str)]) -> Vec<Node> {
    let mut nodes = vec![Node::new(&["h1"]).text(title)];
    for (name, id) in cast {
        let href = format!("/name/{}/", id);
        nodes.push(
            Node::new(&["[data-testid='title-cast-item']"])
                .child(Node::new(&["[data-testid='title-cast-item__actor']"]).text(name))
                .child(
                    Node::new(&["a[href*='/name/']", "a[href*='/name/nm']"])
                        .attr("href", &href)
                        .text(name),
                ),
        );
    }
    nodes
}

/// Title page using the legacy `cast_list` table.
pub fn legacy_title_page(title: &str, cast: &[(&str, &str)]) -> Vec<Node> {
    let mut nodes = vec![Node::new(&["h1"]).text(title)];
    for (name, id) in cast {
        nodes.push(
            Node::new(&[".cast_list tr"]).child(
                Node::new(&[
                    "td:not(.primary_photo) a[href*='/name/']",
                    "a[href*='/name/nm']",
                ])
                .attr("href", &format!("/name/{}/", id))
                .text(name),
            ),
        );
    }
    nodes
}

/// Bare name links outside any cast section, e.g. director credits.
pub fn name_links(people: &[(&str, &str)]) -> Vec<Node> {
    people
        .iter()
        .map(|(name, id)| {
            Node::new(&["a[href*='/name/nm']"])
                .attr("href", &format!("/name/{}/", id))
                .text(name)
        })
        .collect()
}

pub fn profile_page(name: &str) -> Vec<Node> {
    vec![Node::new(&["h1"]).text(name).child(Node::new(&["h1 span"]).text(name))]
}

/// Cast list of `n` generated members, ids `nm1..=nmN`.
pub fn generated_cast(n: usize) -> Vec<(String, String)> {
    (1..=n)
        .map(|i| (format!("Actor {}", i), format!("nm{}", i)))
        .collect()
}

pub fn as_refs(cast: &[(String, String)]) -> Vec<(&str, &str)> {
    cast.iter().map(|(n, i)| (n.as_str(), i.as_str())).collect()
}

#[derive(Debug, Clone)]
struct Suggestion {
    text: String,
    href: Option<String>,
}

/// A tiny site: a home page with a search box, plus static pages by path.
#[derive(Debug, Clone)]
pub struct FakeSite {
    query: String,
    suggestions: Vec<Suggestion>,
    pages: HashMap<String, Vec<Node>>,
}

impl FakeSite {
    /// Suggestions only show up for `query`.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            suggestions: Vec::new(),
            pages: HashMap::new(),
        }
    }

    /// Add a suggestion leading to a page at `path`.
    pub fn suggest(mut self, title: &str, path: &str, nodes: Vec<Node>) -> Self {
        self.suggestions.push(Suggestion {
            text: format!("{}\n2021", title),
            href: Some(path.to_string()),
        });
        self.pages.insert(path.to_string(), nodes);
        self
    }

    /// Add a suggestion whose click goes nowhere.
    pub fn suggest_inert(mut self, title: &str) -> Self {
        self.suggestions.push(Suggestion {
            text: format!("{}\n2021", title),
            href: None,
        });
        self
    }

    pub fn page(mut self, path: &str, nodes: Vec<Node>) -> Self {
        self.pages.insert(path.to_string(), nodes);
        self
    }
}

#[derive(Debug)]
pub struct FakeBrowser {
    site: FakeSite,
    launched: bool,
    history: Vec<String>,
    input: String,
    pub events: Vec<String>,
    pub fail_launch: bool,
    pub fail_close: bool,
    pub last_options: Option<LaunchOptions>,
}

impl FakeBrowser {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site,
            launched: false,
            history: Vec::new(),
            input: String::new(),
            events: Vec::new(),
            fail_launch: false,
            fail_close: false,
            last_options: None,
        }
    }

    /// Already launched, for page-level tests that skip the fixture.
    pub async fn launched(site: FakeSite) -> Self {
        let mut browser = Self::new(site);
        browser.launch(&LaunchOptions::default()).await.unwrap();
        browser
    }

    pub fn count_events(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    fn current(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or("about:blank")
    }

    fn current_path(&self) -> Option<String> {
        Url::parse(self.current()).ok().map(|u| u.path().to_string())
    }

    fn nodes(&self) -> Vec<Node> {
        match self.current_path().as_deref() {
            Some("/") => {
                let mut nodes = vec![Node::new(&["#suggestion-search"]).text(&self.input)];
                if !self.input.is_empty() && self.input == self.site.query {
                    for s in &self.site.suggestions {
                        let mut item =
                            Node::new(&[".react-autosuggest__suggestions-list li"]).text(&s.text);
                        if let Some(href) = &s.href {
                            item = item.attr("href", href);
                        }
                        nodes.push(item);
                    }
                }
                nodes
            }
            Some(path) => self.site.pages.get(path).cloned().unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn resolve(&self, locator: &Locator) -> Vec<Node> {
        let mut roots = self.nodes();
        for step in locator.scope() {
            let mut found = Vec::new();
            find_all(&roots, &step.css, &mut found);
            match found.into_iter().nth(step.position()) {
                Some(node) => roots = node.children,
                None => return Vec::new(),
            }
        }
        let mut found = Vec::new();
        find_all(&roots, &locator.target().css, &mut found);
        found
    }

    fn element(&self, locator: &Locator) -> Result<Node, DriverError> {
        self.resolve(locator)
            .into_iter()
            .nth(locator.position())
            .ok_or_else(|| DriverError::ElementNotFound(locator.to_string()))
    }

    fn ensure_launched(&self) -> Result<(), DriverError> {
        if self.launched {
            Ok(())
        } else {
            Err(DriverError::NotReady)
        }
    }

    fn navigate(&mut self, url: &str) -> Result<NavigationResult, DriverError> {
        let target = Url::parse(BASE_URL)?.join(url)?;
        let path = target.path().to_string();
        if path != "/" && !self.site.pages.contains_key(&path) {
            return Err(DriverError::Navigation(format!("404 for {}", target)));
        }
        self.history.push(target.to_string());
        self.input.clear();
        let title = self
            .element(&Locator::css("h1"))
            .map(|n| n.text)
            .unwrap_or_default();
        Ok(NavigationResult {
            url: target.to_string(),
            title,
        })
    }
}

#[async_trait]
impl Driver for FakeBrowser {
    async fn launch(&mut self, options: &LaunchOptions) -> Result<(), DriverError> {
        self.events.push("launch".into());
        if self.fail_launch {
            return Err(DriverError::Launch("chrome not found".into()));
        }
        self.launched = true;
        self.last_options = Some(options.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.events.push("close".into());
        self.launched = false;
        if self.fail_close {
            return Err(DriverError::Other("browser already gone".into()));
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.launched
    }

    async fn open(&mut self, url: &str) -> Result<NavigationResult, DriverError> {
        self.ensure_launched()?;
        self.events.push(format!("open {}", url));
        self.navigate(url)
    }

    async fn go_back(&mut self) -> Result<(), DriverError> {
        self.ensure_launched()?;
        self.events.push("back".into());
        if self.history.len() > 1 {
            self.history.pop();
        }
        self.input.clear();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.ensure_launched()?;
        Ok(self.current().to_string())
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, DriverError> {
        self.ensure_launched()?;
        Ok(self.resolve(locator).len())
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        self.ensure_launched()?;
        Ok(self
            .resolve(locator)
            .get(locator.position())
            .is_some_and(|n| !n.hidden))
    }

    async fn text(&mut self, locator: &Locator) -> Result<String, DriverError> {
        self.ensure_launched()?;
        Ok(self.element(locator)?.text)
    }

    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.ensure_launched()?;
        Ok(self.element(locator)?.attrs.get(name).cloned())
    }

    async fn set_value(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError> {
        self.ensure_launched()?;
        let node = self.element(locator)?;
        if node.matches("#suggestion-search") {
            self.input = value.to_string();
        }
        self.events.push(format!("type {}", value));
        Ok(())
    }

    async fn clear(&mut self, locator: &Locator) -> Result<(), DriverError> {
        self.ensure_launched()?;
        self.element(locator)?;
        self.input.clear();
        self.events.push("clear".into());
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
        self.ensure_launched()?;
        let node = self.element(locator)?;
        let label = node.text.lines().next().unwrap_or_default().to_string();
        self.events.push(format!("click {}", label));
        if let Some(href) = node.attrs.get("href") {
            self.navigate(href)?;
        }
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.ensure_launched()?;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.ensure_launched()?;
        Ok(format!("<html><!-- {} --></html>", self.current()))
    }
}
