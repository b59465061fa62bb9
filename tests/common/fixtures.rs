use folio::traits::{CompileRequest, CompilerError, DocumentCompiler, PageCountError, PageCounter};
use folio::types::{Chapter, DocumentInfo, Hierarchy, Page};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The two-chapter hierarchy used throughout the docs.
pub fn worked_example_hierarchy() -> Hierarchy {
    Hierarchy::new(vec![
        Chapter::new("Intro", vec![Page::new("01a", "Getting started"), Page::new("01b", "Setup")]),
        Chapter::new("Core", vec![Page::new("02a", "Concepts")]),
    ])
}

pub const WORKED_EXAMPLE_COUNTS: [(&str, u32); 8] = [
    ("cover", 1),
    ("preface", 2),
    ("outline", 1),
    ("chapter-01", 1),
    ("01a", 3),
    ("01b", 2),
    ("chapter-02", 1),
    ("02a", 4),
];

pub const WORKED_EXAMPLE_MAP: [(&str, u32); 8] = [
    ("cover", 1),
    ("preface", 2),
    ("outline", 4),
    ("chapter-01", 5),
    ("01a", 6),
    ("01b", 9),
    ("chapter-02", 11),
    ("02a", 12),
];

pub fn worked_example_compiler(root: &Path) -> SyntheticCompiler {
    let mut compiler = SyntheticCompiler::new(root, worked_example_hierarchy());
    for (unit, pages) in WORKED_EXAMPLE_COUNTS {
        compiler = compiler.with_pages(unit, pages);
    }
    compiler
}

/// One `compile` invocation as seen by the synthetic compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCall {
    pub target: String,
    pub page_offset: Option<u32>,
    pub page_map: Option<String>,
}

/// An in-process stand-in for the document compiler.
///
/// Writes real PDFs with a scripted page count per unit (1 by default). With
/// drift configured, a unit gains extra pages whenever it is given a page
/// offset, imitating a template whose page numbers reflow content.
#[derive(Debug)]
pub struct SyntheticCompiler {
    root: PathBuf,
    hierarchy: Hierarchy,
    document_info: Option<DocumentInfo>,
    page_counts: HashMap<String, u32>,
    drift: HashMap<String, u32>,
    fail_target: Option<String>,
    calls: Rc<RefCell<Vec<CompileCall>>>,
}

impl SyntheticCompiler {
    pub fn new(root: &Path, hierarchy: Hierarchy) -> Self {
        Self {
            root: root.to_path_buf(),
            hierarchy,
            document_info: None,
            page_counts: HashMap::new(),
            drift: HashMap::new(),
            fail_target: None,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_pages(mut self, unit: &str, pages: u32) -> Self {
        self.page_counts.insert(unit.to_string(), pages);
        self
    }

    pub fn with_drift(mut self, unit: &str, extra_pages: u32) -> Self {
        self.drift.insert(unit.to_string(), extra_pages);
        self
    }

    pub fn failing_on(mut self, unit: &str) -> Self {
        self.fail_target = Some(unit.to_string());
        self
    }

    pub fn with_document_info(mut self, info: DocumentInfo) -> Self {
        self.document_info = Some(info);
        self
    }

    /// Shared handle to the call log; stays valid after the compiler is
    /// moved into a pipeline.
    pub fn call_log(&self) -> Rc<RefCell<Vec<CompileCall>>> {
        Rc::clone(&self.calls)
    }

    fn pages_for(&self, request: &CompileRequest<'_>) -> u32 {
        let target = request.target.as_str();
        let base = self.page_counts.get(target).copied().unwrap_or(1);
        let drift = if request.page_offset.is_some() { self.drift.get(target).copied().unwrap_or(0) } else { 0 };
        base + drift
    }

    fn failed(diagnostics: &str) -> CompilerError {
        CompilerError::Failed {
            command: "synthetic".into(),
            status: "exit status: 1".into(),
            diagnostics: diagnostics.into(),
        }
    }
}

impl DocumentCompiler for SyntheticCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<(), CompilerError> {
        self.calls.borrow_mut().push(CompileCall {
            target: request.target.to_string(),
            page_offset: request.page_offset,
            page_map: request.page_map.map(|m| m.to_json().unwrap()),
        });
        if self.fail_target.as_deref() == Some(request.target.as_str()) {
            return Err(Self::failed(&format!("error: unknown variable in '{}'", request.target)));
        }

        let pages = self.pages_for(request);
        let labels: Vec<String> = (0..pages)
            .map(|i| match request.page_offset {
                Some(offset) => format!("{} page {}", request.target, offset + i),
                None => format!("{} page ?", request.target),
            })
            .collect();
        write_pdf(request.output, &labels).map_err(|e| CompilerError::InvalidOutput(e.to_string()))
    }

    fn query(&self, source: &Path, selector: &str) -> Result<String, CompilerError> {
        if !source.is_file() {
            return Err(Self::failed("probe source does not exist"));
        }
        let value = match selector {
            "<hierarchy>" => serde_json::to_value(&self.hierarchy).unwrap(),
            "<document-info>" => match &self.document_info {
                Some(info) => serde_json::to_value(info).unwrap(),
                None => return Err(Self::failed("unknown variable: title")),
            },
            other => return Err(Self::failed(&format!("unknown label {other}"))),
        };
        Ok(json!([{ "func": "metadata", "value": value, "label": selector }]).to_string())
    }

    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// A page counter whose tool output never contains a page count.
#[derive(Debug, Clone, Copy, Default)]
pub struct GarbledPageCounter;

impl PageCounter for GarbledPageCounter {
    fn count_pages(&self, path: &Path) -> Result<u32, PageCountError> {
        Err(PageCountError::Unparsable { path: path.to_path_buf(), output: "garbage".into() })
    }

    fn name(&self) -> &'static str {
        "garbled"
    }
}

/// Writes an A4 PDF with one page per label, the label drawn on its page.
pub fn write_pdf(path: &Path, labels: &[String]) -> Result<(), lopdf::Error> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 770.into()]),
                Operation::new("Tj", vec![Object::String(label.clone().into_bytes(), StringFormat::Literal)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => labels.len() as i64,
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}
