//! XML representation of IPPcode22 programs.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <program language="IPPcode22">
//!   <instruction order="1" opcode="WRITE">
//!     <arg1 type="string">hello</arg1>
//!   </instruction>
//! </program>
//! ```

use std::collections::BTreeMap;

use ippcode_common::{Instruction, Opcode, Operand, Program, Value, ValueKind, Variable};
use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::XmlError;

const ROOT_ATTRIBUTES: [&str; 3] = ["language", "name", "description"];
const ARGUMENT_NAMES: [&str; 3] = ["arg1", "arg2", "arg3"];

/// Serialize a program. Instructions are numbered from 1 in program order.
pub fn to_xml(program: &Program) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<program language=\"IPPcode22\">\n");

    for (idx, instr) in program.instructions.iter().enumerate() {
        let operands = instr.operands();
        let head = format!(
            "  <instruction order=\"{}\" opcode=\"{}\"",
            idx + 1,
            instr.opcode()
        );
        if operands.is_empty() {
            out.push_str(&head);
            out.push_str("/>\n");
            continue;
        }

        out.push_str(&head);
        out.push_str(">\n");
        for (pos, operand) in operands.iter().enumerate() {
            let (ty, text) = argument_parts(operand);
            out.push_str(&format!(
                "    <arg{n} type=\"{ty}\">{}</arg{n}>\n",
                escape_xml(&text),
                n = pos + 1
            ));
        }
        out.push_str("  </instruction>\n");
    }

    out.push_str("</program>\n");
    out
}

/// `type` attribute and text content for an operand.
fn argument_parts(operand: &Operand) -> (&'static str, String) {
    match operand {
        Operand::Var(var) => ("var", var.to_string()),
        Operand::Const(value) => (value.kind().name(), value.escaped_text()),
        Operand::Label(name) => ("label", name.clone()),
        Operand::Type(kind) => ("type", kind.name().to_string()),
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Load a program from its XML representation. Instructions are returned
/// sorted by their `order` attribute.
pub fn load_xml(text: &str) -> Result<Program, XmlError> {
    let doc = Document::parse(text).map_err(|e| XmlError::Malformed(e.to_string()))?;
    let root = doc.root_element();
    check_root(root)?;

    let mut by_order = BTreeMap::new();
    for node in root.children().filter(Node::is_element) {
        let (order, instr) = load_instruction(node)?;
        if by_order.insert(order, instr).is_some() {
            return Err(XmlError::DuplicateOrder(order));
        }
    }

    debug!(instructions = by_order.len(), "XML program loaded");
    Ok(Program::new(by_order.into_values().collect()))
}

fn check_root(root: Node<'_, '_>) -> Result<(), XmlError> {
    let name = root.tag_name().name();
    if name != "program" {
        return Err(XmlError::UnexpectedRoot(name.to_string()));
    }

    let language = root.attribute("language").ok_or(XmlError::MissingLanguage)?;
    if !language.eq_ignore_ascii_case("IPPcode22") {
        return Err(XmlError::UnsupportedLanguage(language.to_string()));
    }

    for attr in root.attributes() {
        if !ROOT_ATTRIBUTES.contains(&attr.name()) {
            return Err(XmlError::UnexpectedAttribute {
                element: name.to_string(),
                attribute: attr.name().to_string(),
            });
        }
    }
    Ok(())
}

fn load_instruction(node: Node<'_, '_>) -> Result<(u64, Instruction), XmlError> {
    let name = node.tag_name().name();
    if name != "instruction" {
        return Err(XmlError::UnexpectedElement(name.to_string()));
    }

    for attr in node.attributes() {
        if attr.name() != "order" && attr.name() != "opcode" {
            return Err(XmlError::UnexpectedAttribute {
                element: name.to_string(),
                attribute: attr.name().to_string(),
            });
        }
    }
    let order_text = node
        .attribute("order")
        .ok_or(XmlError::MissingAttribute("order"))?;
    let opcode_text = node
        .attribute("opcode")
        .ok_or(XmlError::MissingAttribute("opcode"))?;

    let order = order_text
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| XmlError::InvalidOrder(order_text.to_string()))?;

    let opcode = Opcode::from_mnemonic(opcode_text.trim())
        .map_err(|source| XmlError::Instruction { order, source })?;

    let operands = load_arguments(node, order)?;
    let instr = Instruction::new(opcode, operands)
        .map_err(|source| XmlError::Instruction { order, source })?;
    Ok((order, instr))
}

/// Collect `arg1`..`arg3` in position order, rejecting duplicates and gaps.
fn load_arguments(node: Node<'_, '_>, order: u64) -> Result<Vec<Operand>, XmlError> {
    let mut slots: [Option<Operand>; 3] = [None, None, None];

    for arg in node.children().filter(Node::is_element) {
        let name = arg.tag_name().name();
        let position = ARGUMENT_NAMES
            .iter()
            .position(|&n| n == name)
            .ok_or_else(|| XmlError::UnexpectedArgument {
                order,
                name: name.to_string(),
            })?;

        let mut attributes = arg.attributes();
        let ty = match (attributes.next(), attributes.next()) {
            (Some(attr), None) if attr.name() == "type" => attr.value(),
            _ => {
                return Err(XmlError::ArgumentAttributes {
                    order,
                    name: name.to_string(),
                })
            }
        };

        if slots[position].is_some() {
            return Err(XmlError::DuplicateArgument {
                order,
                name: name.to_string(),
            });
        }
        slots[position] = Some(load_operand(ty, arg.text().unwrap_or(""), order)?);
    }

    let count = slots.iter().filter(|s| s.is_some()).count();
    let mut operands = Vec::with_capacity(count);
    for (idx, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(operand) => operands.push(operand),
            None if idx < count => {
                return Err(XmlError::MissingArgument {
                    order,
                    position: idx + 1,
                })
            }
            None => {}
        }
    }
    Ok(operands)
}

fn load_operand(ty: &str, text: &str, order: u64) -> Result<Operand, XmlError> {
    let invalid = |source| XmlError::Instruction { order, source };
    match ty {
        "var" => Variable::parse(text).map(Operand::Var).map_err(invalid),
        "label" => Ok(Operand::Label(text.trim().to_string())),
        "type" => ValueKind::try_from(text.trim())
            .map(Operand::Type)
            .map_err(invalid),
        _ => match ValueKind::from_name(ty) {
            Some(kind) => Value::from_literal(kind, text)
                .map(Operand::Const)
                .map_err(invalid),
            None => Err(XmlError::UnknownArgumentType {
                order,
                ty: ty.to_string(),
            }),
        },
    }
}
