//! JSON description of a project, used by `import` and `export`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RestructureError, Result};
use crate::models::{
    CallExpr, Callee, ElementId, ElementKind, ProgramModel, RefShape, SyntaxNode,
};

use super::Workspace;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_only: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ReferenceSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// A class; `file` is ignored for nested classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallSpec>,
}

/// A module-level function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub file: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallSpec>,
}

/// A call in a function body. `callee` is an element address; addresses that
/// do not name an element become unresolved calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSpec {
    pub callee: String,
    /// Only reachable through inference.
    #[serde(default, skip_serializing_if = "is_false")]
    pub implicit: bool,
    /// Made inside a nested lambda.
    #[serde(default, skip_serializing_if = "is_false")]
    pub deferred: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSpec {
    pub owner: String,
    pub target: String,
    pub shape: RefShape,
    /// Byte offset in the owner; every occurrence is registered when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Build a workspace. Bodies are filled in after every element exists, so
    /// calls may name functions declared later in the snapshot.
    pub fn build(&self) -> Result<Workspace> {
        let mut ws = Workspace::new();
        for dir in &self.directories {
            ws.ensure_directory(dir)?;
        }
        for file in &self.files {
            ws.add_file_at(&file.path, &file.content)?;
        }
        for dir in &self.read_only {
            let id = lookup(&ws, dir)?;
            ws.set_read_only(id, true)?;
        }

        let mut pending: Vec<(ElementId, &[CallSpec])> = Vec::new();
        for class in &self.classes {
            let file = lookup(&ws, &class.file)?;
            add_class(&mut ws, file, class, &mut pending)?;
        }
        for function in &self.functions {
            let file = lookup(&ws, &function.file)?;
            let id = ws.add_function(file, &function.name, SyntaxNode::block(Vec::new()))?;
            pending.push((id, &function.calls));
        }
        for (function, calls) in pending {
            let body = calls.iter().map(|c| call_node(&ws, c)).collect();
            ws.set_body(function, SyntaxNode::block(body))?;
        }

        for reference in &self.references {
            let owner = lookup(&ws, &reference.owner)?;
            let target = lookup(&ws, &reference.target)?;
            match reference.start {
                Some(start) => {
                    ws.add_reference(owner, target, reference.shape, start)?;
                }
                None => {
                    let added = ws.add_rendered_references(owner, target, reference.shape)?;
                    if added.is_empty() {
                        return Err(RestructureError::Snapshot {
                            detail: format!(
                                "{} does not mention {} as a {} reference",
                                reference.owner,
                                reference.target,
                                reference.shape.as_str()
                            ),
                        });
                    }
                }
            }
        }
        Ok(ws)
    }

    /// Describe a workspace. Every reference is written with its offset.
    #[must_use]
    pub fn capture(ws: &Workspace) -> Self {
        let mut snapshot = Self::default();
        for id in ws.descendants(super::ROOT) {
            let Some(element) = ws.element(id) else {
                continue;
            };
            let parent_kind = element.parent.and_then(|p| ws.kind_of(p));
            match element.kind {
                ElementKind::Directory => {
                    let path = ws.path_of(id);
                    if ws.is_read_only(id) {
                        snapshot.read_only.push(path.clone());
                    }
                    snapshot.directories.push(path);
                }
                ElementKind::File(_) => snapshot.files.push(FileSpec {
                    path: ws.path_of(id),
                    content: ws.content(id).unwrap_or_default().to_string(),
                }),
                ElementKind::Class if parent_kind.is_some_and(|k| k.is_file()) => {
                    let mut class = capture_class(ws, id);
                    class.file = element.parent.map(|p| ws.path_of(p)).unwrap_or_default();
                    snapshot.classes.push(class);
                }
                ElementKind::Function if parent_kind.is_some_and(|k| k.is_file()) => {
                    snapshot.functions.push(FunctionSpec {
                        file: element.parent.map(|p| ws.path_of(p)).unwrap_or_default(),
                        name: element.name.clone(),
                        calls: capture_calls(ws, id),
                    });
                }
                ElementKind::Class | ElementKind::Function => {}
            }
        }
        // directories that only exist as parents of files are implied
        snapshot
            .directories
            .retain(|d| !snapshot.files.iter().any(|f| f.path.starts_with(&format!("{d}/"))));

        let mut refs: Vec<_> = ws.references().collect();
        refs.sort_by_key(|r| (r.owner, r.range.start));
        snapshot.references = refs
            .into_iter()
            .map(|r| ReferenceSpec {
                owner: ws.path_of(r.owner),
                target: ws.path_of(r.target),
                shape: r.shape,
                start: Some(r.range.start),
            })
            .collect();
        snapshot
    }
}

fn lookup(ws: &Workspace, address: &str) -> Result<ElementId> {
    ws.find(address).ok_or_else(|| RestructureError::ElementNotFound {
        address: address.to_string(),
    })
}

fn add_class<'a>(
    ws: &mut Workspace,
    parent: ElementId,
    spec: &'a ClassSpec,
    pending: &mut Vec<(ElementId, &'a [CallSpec])>,
) -> Result<()> {
    let class = ws.add_class(parent, &spec.name)?;
    for method in &spec.methods {
        let id = ws.add_function(class, &method.name, SyntaxNode::block(Vec::new()))?;
        pending.push((id, &method.calls));
    }
    for nested in &spec.classes {
        add_class(ws, class, nested, pending)?;
    }
    Ok(())
}

fn call_node(ws: &Workspace, spec: &CallSpec) -> SyntaxNode {
    let callee = match ws.find(&spec.callee) {
        Some(id) if spec.implicit => Callee::Implicit(id),
        Some(id) => Callee::Direct(id),
        None => Callee::Unresolved(spec.callee.clone()),
    };
    let call = SyntaxNode::call(callee);
    if spec.deferred {
        SyntaxNode::Lambda {
            body: Box::new(call),
        }
    } else {
        call
    }
}

fn capture_class(ws: &Workspace, class: ElementId) -> ClassSpec {
    let mut spec = ClassSpec {
        file: String::new(),
        name: ws.element(class).map(|e| e.name.clone()).unwrap_or_default(),
        methods: Vec::new(),
        classes: Vec::new(),
    };
    for child in ws.children(class) {
        match ws.kind_of(child) {
            Some(ElementKind::Function) => spec.methods.push(MethodSpec {
                name: ws.element(child).map(|e| e.name.clone()).unwrap_or_default(),
                calls: capture_calls(ws, child),
            }),
            Some(ElementKind::Class) => spec.classes.push(capture_class(ws, child)),
            _ => {}
        }
    }
    spec
}

fn capture_calls(ws: &Workspace, function: ElementId) -> Vec<CallSpec> {
    let mut calls = Vec::new();
    if let Some(body) = ws.body(function) {
        collect_calls(ws, body, false, &mut calls);
    }
    calls
}

fn collect_calls(ws: &Workspace, node: &SyntaxNode, deferred: bool, out: &mut Vec<CallSpec>) {
    match node {
        SyntaxNode::Block { body } => {
            for child in body {
                collect_calls(ws, child, deferred, out);
            }
        }
        SyntaxNode::Call(CallExpr { callee, args }) => {
            let (callee, implicit) = match callee {
                Callee::Direct(id) => (ws.path_of(*id), false),
                Callee::Implicit(id) => (ws.path_of(*id), true),
                Callee::Unresolved(name) => (name.clone(), false),
            };
            out.push(CallSpec {
                callee,
                implicit,
                deferred,
            });
            for arg in args {
                collect_calls(ws, arg, deferred, out);
            }
        }
        SyntaxNode::Lambda { body } => collect_calls(ws, body, true, out),
        SyntaxNode::Name { .. } | SyntaxNode::Literal { .. } => {}
    }
}
