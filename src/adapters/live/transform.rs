//! Live adapter for the `MarkdownTransformer` port built on pulldown-cmark.
//!
//! Headings nest by level and own every line up to the next heading of the
//! same or higher level. List items nest by list depth and take their first
//! paragraph as content. Every other block becomes a leaf under the
//! enclosing heading or item.

use std::collections::BTreeSet;
use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::error::TransformError;
use crate::node::{LineRange, Node};
use crate::options::Frontmatter;
use crate::ports::transform::{Feature, MarkdownTransformer, TransformOptions, Transformed};

/// Markdown transformer backed by pulldown-cmark.
#[derive(Debug, Default, Clone, Copy)]
pub struct PulldownTransformer;

impl MarkdownTransformer for PulldownTransformer {
    fn transform(
        &self,
        markdown: &str,
        options: &TransformOptions,
    ) -> Result<Transformed, TransformError> {
        let parser_options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_MATH
            | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
        let events: Vec<(Event<'_>, Range<usize>)> =
            Parser::new_ext(markdown, parser_options).into_offset_iter().collect();
        TreeBuilder::new(markdown, events, options).build()
    }
}

/// Maps byte offsets to 0-based line numbers.
struct LineIndex {
    starts: Vec<usize>,
    total: u32,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts: Vec<usize> =
            std::iter::once(0).chain(text.match_indices('\n').map(|(i, _)| i + 1)).collect();
        let total = if text.is_empty() {
            0
        } else if text.ends_with('\n') {
            starts.len() - 1
        } else {
            starts.len()
        };
        Self { starts, total: to_u32(total) }
    }

    fn line_of(&self, offset: usize) -> u32 {
        to_u32(self.starts.partition_point(|&start| start <= offset).saturating_sub(1))
    }

    fn span(&self, range: &Range<usize>) -> LineRange {
        let start = self.line_of(range.start);
        let last = self.line_of(range.end.saturating_sub(1).max(range.start));
        LineRange { start, end: last + 1 }
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

enum FrameKind {
    Root,
    Heading(HeadingLevel),
    Item { content_done: bool },
}

struct Frame<'a> {
    kind: FrameKind,
    node: Node,
    start: u32,
    end: Option<u32>,
    content: Vec<Event<'a>>,
}

impl Frame<'_> {
    fn new(kind: FrameKind, start: u32) -> Self {
        Self { kind, node: Node::default(), start, end: None, content: Vec::new() }
    }
}

struct TreeBuilder<'a, 'o> {
    events: std::vec::IntoIter<(Event<'a>, Range<usize>)>,
    lines: LineIndex,
    options: &'o TransformOptions,
    stack: Vec<Frame<'a>>,
    features: BTreeSet<Feature>,
    frontmatter: Option<String>,
}

impl<'a, 'o> TreeBuilder<'a, 'o> {
    fn new(
        markdown: &str,
        events: Vec<(Event<'a>, Range<usize>)>,
        options: &'o TransformOptions,
    ) -> Self {
        Self {
            events: events.into_iter(),
            lines: LineIndex::new(markdown),
            options,
            stack: vec![Frame::new(FrameKind::Root, 0)],
            features: BTreeSet::new(),
            frontmatter: None,
        }
    }

    fn build(mut self) -> Result<Transformed, TransformError> {
        while let Some((event, range)) = self.events.next() {
            match event {
                Event::Start(Tag::MetadataBlock(_)) => self.read_frontmatter(),
                Event::Start(Tag::Heading { level, .. }) if !self.in_item() => {
                    self.open_heading(level, &range)
                }
                Event::Start(Tag::List(_)) | Event::End(TagEnd::List(_)) => {
                    self.finish_item_content()
                }
                Event::Start(Tag::Item) => self.open_item(&range),
                Event::End(TagEnd::Item) => self.close_item(),
                Event::Start(Tag::Paragraph) if self.item_wants_content() => {
                    self.read_item_paragraph();
                }
                // Tight items carry their inline content without a paragraph.
                Event::Start(tag) if is_inline(&tag) && self.item_open() => {
                    self.push_inline(Event::Start(tag));
                }
                Event::End(end) if is_inline_end(end) && self.item_open() => {
                    self.push_inline(Event::End(end));
                }
                Event::Start(tag) => self.read_block(tag, &range),
                Event::Rule => self.attach_leaf("<hr>".into(), "hr", &range),
                Event::End(_) => {}
                inline => self.push_inline(inline),
            }
        }
        self.finish()
    }

    fn in_item(&self) -> bool {
        matches!(self.stack.last().map(|f| &f.kind), Some(FrameKind::Item { .. }))
    }

    fn item_open(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame { kind: FrameKind::Item { content_done: false }, .. })
        )
    }

    fn item_wants_content(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame { kind: FrameKind::Item { content_done: false }, content, .. })
                if content.is_empty()
        )
    }

    fn finish_item_content(&mut self) {
        if let Some(Frame { kind: FrameKind::Item { content_done }, .. }) = self.stack.last_mut() {
            *content_done = true;
        }
    }

    fn push_inline(&mut self, event: Event<'a>) {
        self.note_feature(&event);
        let event = self.resolve_image(event);
        if let Some(Frame { kind: FrameKind::Item { content_done: false }, content, .. }) =
            self.stack.last_mut()
        {
            content.push(event);
        }
    }

    fn read_frontmatter(&mut self) {
        let mut source = String::new();
        for (event, _) in self.events.by_ref() {
            match event {
                Event::Text(text) => source.push_str(&text),
                Event::End(TagEnd::MetadataBlock(_)) => break,
                _ => {}
            }
        }
        self.frontmatter = Some(source);
    }

    fn open_heading(&mut self, level: HeadingLevel, range: &Range<usize>) {
        let start = self.lines.line_of(range.start);
        while let Some(Frame { kind: FrameKind::Heading(open), .. }) = self.stack.last() {
            if *open < level {
                break;
            }
            self.close_top(start);
        }
        let content = self.read_until(|event| matches!(event, Event::End(TagEnd::Heading(_))));
        let mut frame = Frame::new(FrameKind::Heading(level), start);
        frame.node.payload.tag = Some(level.to_string());
        let (content, folded) = split_fold_marker(content);
        frame.node.content = render_inline(content);
        if folded {
            frame.node.payload.fold = Some(1);
        }
        self.stack.push(frame);
    }

    fn open_item(&mut self, range: &Range<usize>) {
        self.finish_item_content();
        let span = self.lines.span(range);
        let mut frame = Frame::new(FrameKind::Item { content_done: false }, span.start);
        frame.end = Some(span.end);
        frame.node.payload.tag = Some("li".into());
        self.stack.push(frame);
    }

    fn close_item(&mut self) {
        if self.in_item() {
            let end = self.stack.last().and_then(|f| f.end).unwrap_or(self.lines.total);
            self.close_top(end);
        }
    }

    fn read_item_paragraph(&mut self) {
        let content = self.read_until(|event| matches!(event, Event::End(TagEnd::Paragraph)));
        if let Some(frame) = self.stack.last_mut() {
            frame.content = content;
        }
        self.finish_item_content();
    }

    fn read_block(&mut self, tag: Tag<'a>, range: &Range<usize>) {
        self.finish_item_content();
        let name = block_name(&tag);
        let is_paragraph = matches!(tag, Tag::Paragraph);
        self.note_feature(&Event::Start(tag.clone()));
        let mut events = vec![Event::Start(tag)];
        let mut depth = 1usize;
        while let Some((event, _)) = self.events.next() {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                _ => {}
            }
            self.note_feature(&event);
            events.push(self.resolve_image(event));
            if depth == 0 {
                break;
            }
        }
        let html = if is_paragraph {
            render_inline(events[1..events.len().saturating_sub(1)].to_vec())
        } else {
            render_html(events).trim().to_string()
        };
        self.attach_leaf(html, &name, range);
    }

    fn attach_leaf(&mut self, content: String, tag: &str, range: &Range<usize>) {
        self.finish_item_content();
        let mut node = Node::leaf(content);
        node.payload.tag = Some(tag.to_string());
        node.payload.lines = Some(self.lines.span(range).encode());
        if let Some(frame) = self.stack.last_mut() {
            frame.node.children.push(node);
        }
    }

    fn read_until(&mut self, is_end: impl Fn(&Event<'a>) -> bool) -> Vec<Event<'a>> {
        let mut collected = Vec::new();
        while let Some((event, _)) = self.events.next() {
            if is_end(&event) {
                break;
            }
            self.note_feature(&event);
            collected.push(self.resolve_image(event));
        }
        collected
    }

    fn close_top(&mut self, end: u32) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        let end = frame.end.unwrap_or(end).max(frame.start);
        if !frame.content.is_empty() {
            let (content, folded) = split_fold_marker(std::mem::take(&mut frame.content));
            frame.node.content = render_inline(content);
            if folded {
                frame.node.payload.fold = Some(1);
            }
        }
        frame.node.payload.lines = Some(LineRange { start: frame.start, end }.encode());
        match self.stack.last_mut() {
            Some(parent) => parent.node.children.push(frame.node),
            None => self.stack.push(frame),
        }
    }

    fn finish(mut self) -> Result<Transformed, TransformError> {
        while self.stack.len() > 1 {
            let end = self.lines.total;
            self.close_top(end);
        }
        let mut root = self.stack.pop().map(|f| f.node).unwrap_or_default();
        let frontmatter = match self.frontmatter {
            Some(source) if source.trim().is_empty() => Some(Frontmatter::default()),
            Some(source) => Some(serde_yaml::from_str::<Frontmatter>(&source)?),
            None => None,
        };
        if let Some(title) =
            frontmatter.as_ref().and_then(|f| f.extra.get("title")).and_then(|t| t.as_str())
        {
            root.content = crate::node::html_escape(title);
        }
        Ok(Transformed { root, frontmatter, features: self.features })
    }

    fn note_feature(&mut self, event: &Event<'_>) {
        match event {
            Event::Start(Tag::Table(_)) => {
                self.features.insert(Feature::Table);
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.features.insert(Feature::Code);
            }
            Event::InlineMath(_) | Event::DisplayMath(_) => {
                self.features.insert(Feature::Math);
            }
            _ => {}
        }
    }

    fn resolve_image(&self, event: Event<'a>) -> Event<'a> {
        let Some(resolve) = &self.options.image_resolver else {
            return event;
        };
        match event {
            Event::Start(Tag::Image { link_type, dest_url, title, id })
                if !has_scheme(&dest_url) =>
            {
                let dest_url = resolve(&*dest_url).into();
                Event::Start(Tag::Image { link_type, dest_url, title, id })
            }
            other => other,
        }
    }
}

/// Returns `true` for sources like `https:`, `data:` or `vscode-resource:`.
fn has_scheme(src: &str) -> bool {
    src.split_once(':').is_some_and(|(scheme, _)| {
        !scheme.is_empty() && scheme.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    })
}

fn is_inline(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn is_inline_end(end: TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
    )
}

fn block_name(tag: &Tag<'_>) -> String {
    match tag {
        Tag::Paragraph => "p".into(),
        Tag::Heading { level, .. } => level.to_string(),
        Tag::CodeBlock(_) => "pre".into(),
        Tag::Table(_) => "table".into(),
        Tag::BlockQuote(_) => "blockquote".into(),
        Tag::HtmlBlock => "html".into(),
        Tag::FootnoteDefinition(_) => "footnote".into(),
        Tag::DefinitionList => "dl".into(),
        _ => "div".into(),
    }
}

/// Strips a `<!-- markmap: fold -->` comment, reporting whether one was found.
fn split_fold_marker(events: Vec<Event<'_>>) -> (Vec<Event<'_>>, bool) {
    let mut folded = false;
    let kept = events
        .into_iter()
        .filter(|event| match event {
            Event::InlineHtml(html) | Event::Html(html) if is_fold_marker(html) => {
                folded = true;
                false
            }
            _ => true,
        })
        .collect();
    (kept, folded)
}

fn is_fold_marker(html: &str) -> bool {
    html.trim()
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->"))
        .and_then(|body| body.trim().strip_prefix("markmap:"))
        .is_some_and(|directive| directive.split_whitespace().any(|word| word == "fold"))
}

fn render_html(events: Vec<Event<'_>>) -> String {
    let mut out = String::new();
    pulldown_cmark::html::push_html(&mut out, events.into_iter());
    out
}

fn render_inline(events: Vec<Event<'_>>) -> String {
    render_html(events).trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::node::{check_line_ranges, NodePath};

    fn transform(md: &str) -> Transformed {
        PulldownTransformer.transform(md, &TransformOptions::default()).unwrap()
    }

    fn lines(node: &Node) -> Option<LineRange> {
        node.payload.line_range()
    }

    #[test]
    fn headings_nest_by_level_and_own_their_section() {
        let md = "# A\ntext\n## B\n- x\n## C\n# D\n";
        let out = transform(md);
        let root = &out.root;
        assert!(root.payload.lines.is_none());
        assert_eq!(root.children.len(), 2);
        let a = &root.children[0];
        assert_eq!(a.content, "A");
        assert_eq!(a.payload.tag.as_deref(), Some("h1"));
        assert_eq!(lines(a), Some(LineRange { start: 0, end: 5 }));
        assert_eq!(a.children.len(), 3);
        assert_eq!(a.children[0].content, "text");
        assert_eq!(lines(&a.children[1]), Some(LineRange { start: 2, end: 4 }));
        assert_eq!(lines(&a.children[2]), Some(LineRange { start: 4, end: 5 }));
        assert_eq!(lines(&root.children[1]), Some(LineRange { start: 5, end: 6 }));
        assert_eq!(check_line_ranges(root), Ok(()));
    }

    #[test]
    fn list_items_nest_and_take_their_first_paragraph() {
        let md = "## Foo\n\n- one\n  - one.a\n  - one.b\n- two\n";
        let out = transform(md);
        let foo = &out.root.children[0];
        let one = &foo.children[0];
        assert_eq!(one.content, "one");
        assert_eq!(one.payload.tag.as_deref(), Some("li"));
        assert_eq!(one.children.len(), 2);
        assert_eq!(one.children[1].content, "one.b");
        assert_eq!(lines(&one.children[1]), Some(LineRange { start: 4, end: 5 }));
        assert_eq!(foo.children[1].content, "two");
        assert_eq!(check_line_ranges(&out.root), Ok(()));
    }

    #[test]
    fn loose_items_keep_later_paragraphs_as_children() {
        let md = "- first\n\n  more\n\n- second\n";
        let out = transform(md);
        let first = &out.root.children[0];
        assert_eq!(first.content, "first");
        assert_eq!(first.children[0].content, "more");
        assert_eq!(check_line_ranges(&out.root), Ok(()));
    }

    #[test]
    fn frontmatter_is_parsed_and_lines_stay_absolute() {
        let md = "---\ntitle: Book\nmarkmap:\n  maxWidth: 300\n---\n# Intro\n";
        let out = transform(md);
        let front = out.frontmatter.unwrap();
        assert_eq!(front.markmap.unwrap().max_width, Some(300));
        assert_eq!(out.root.content, "Book");
        assert_eq!(lines(&out.root.children[0]), Some(LineRange { start: 5, end: 6 }));
    }

    #[test]
    fn malformed_frontmatter_is_an_error() {
        let err = PulldownTransformer
            .transform("---\n[unclosed\n---\n# A\n", &TransformOptions::default())
            .unwrap_err();
        assert!(matches!(err, TransformError::Frontmatter(_)));
    }

    #[test]
    fn unexpected_option_values_do_not_fail_the_frontmatter() {
        let md = "---\nmarkmap:\n  activeNode:\n    placement: top\n  duration: 0.5\n---\n# A\n";
        let out = transform(md);
        let markmap = out.frontmatter.unwrap().markmap.unwrap();
        assert_eq!(markmap.duration, None);
        assert_eq!(out.root.children[0].content, "A");
    }

    #[test]
    fn features_are_detected() {
        let md = "# A\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n```rust\nfn x() {}\n```\n\n$x^2$\n";
        let out = transform(md);
        let expected = [Feature::Table, Feature::Math, Feature::Code].into_iter().collect();
        assert_eq!(out.features, expected);
        let a = &out.root.children[0];
        assert_eq!(a.children[0].payload.tag.as_deref(), Some("table"));
        assert!(a.children[1].content.starts_with("<pre>"));
    }

    #[test]
    fn fold_comment_marks_node_and_is_removed() {
        let md = "## Closed <!-- markmap: fold -->\n- hidden\n";
        let out = transform(md);
        let closed = &out.root.children[0];
        assert!(closed.payload.is_folded());
        assert_eq!(closed.content, "Closed");
    }

    #[test]
    fn relative_images_go_through_the_resolver() {
        let options = TransformOptions {
            image_resolver: Some(Arc::new(|src: &str| format!("file:///docs/{src}"))),
            html_parser: None,
        };
        let md = "- ![a](img/a.png) and ![b](https://x.test/b.png)\n";
        let out = PulldownTransformer.transform(md, &options).unwrap();
        let content = &out.root.get(&NodePath(vec![0])).unwrap().content;
        assert!(content.contains("src=\"file:///docs/img/a.png\""));
        assert!(content.contains("src=\"https://x.test/b.png\""));
    }

    #[test]
    fn tight_items_keep_inline_markup_in_their_content() {
        let md = "## Foo\n- **Key**: details\n- [link](a.md) text\n";
        let out = transform(md);
        let foo = &out.root.children[0];
        assert_eq!(foo.children.len(), 2);
        assert_eq!(foo.children[0].content, "<strong>Key</strong>: details");
        assert!(foo.children[0].children.is_empty());
        assert_eq!(foo.children[1].content, "<a href=\"a.md\">link</a> text");
        assert!(foo.children[1].children.is_empty());
        assert_eq!(check_line_ranges(&out.root), Ok(()));
    }

    #[test]
    fn tight_item_with_markup_still_nests_its_sublist() {
        let md = "- *one* a\n  - one.a\n";
        let out = transform(md);
        let one = &out.root.children[0];
        assert_eq!(one.content, "<em>one</em> a");
        assert_eq!(one.children.len(), 1);
        assert_eq!(one.children[0].content, "one.a");
    }

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("https://a"));
        assert!(has_scheme("data:image/png;base64,xx"));
        assert!(has_scheme("vscode-resource:/x"));
        assert!(!has_scheme("img/a.png"));
        assert!(!has_scheme("./a:b.png"));
    }

    #[test]
    fn empty_document_yields_bare_root() {
        let out = transform("");
        assert_eq!(out.root, Node::default());
        assert!(out.frontmatter.is_none());
    }
}
