//! Triple emission: turning an accepted record into RDF statements.
//!
//! Each record becomes one block of triples linking an actor, an event and
//! an object through blank nodes. Identity declarations (`actorID`,
//! `objectID`) appear only in the first block that mentions the identity.

use std::fmt::{self, Write as _};

use crate::error::{Error, FieldError, Result};
use crate::identity::IdentityTracker;
use crate::record::{AuditRecord, fields};

/// Fixed schema predicate names.
pub mod predicates {
    pub const ACTION: &str = "action";
    pub const ACTION_TYPE: &str = "action_type";
    pub const HOSTNAME: &str = "hostname";
    pub const ID: &str = "id";
    pub const PID: &str = "pid";
    pub const PPID: &str = "ppid";
    pub const TIMESTAMP: &str = "timestamp";
    pub const ACTS_ON: &str = "acts_on";
    pub const OBJECT: &str = "object";
    pub const ACTOR_ID: &str = "actorID";
    pub const OBJECT_ID: &str = "objectID";
}

/// A blank node, labelled from an identity value.
///
/// `[A-Za-z0-9-]` is kept as is (except a leading `-`); every other byte,
/// `_` included, becomes `_XX`. Equal values share a label and distinct
/// values never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(String);

impl BlankNode {
    pub fn new(value: &str) -> Self {
        let mut label = String::with_capacity(value.len());
        for (i, byte) in value.bytes().enumerate() {
            let plain = byte.is_ascii_alphanumeric() || (byte == b'-' && i > 0);
            if plain {
                label.push(byte as char);
            } else {
                let _ = write!(label, "_{byte:02X}");
            }
        }
        Self(label)
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// The object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Node(BlankNode),
    Literal(String),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Node(node) => fmt::Display::fmt(node, f),
            Term::Literal(value) => {
                f.write_char('"')?;
                for c in value.chars() {
                    match c {
                        '\\' => f.write_str("\\\\")?,
                        '"' => f.write_str("\\\"")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        c if c.is_control() => write!(f, "\\u{:04X}", c as u32)?,
                        c => f.write_char(c)?,
                    }
                }
                f.write_char('"')
            }
        }
    }
}

/// `subject <predicate> object .`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: BlankNode,
    pub predicate: &'static str,
    pub object: Term,
}

impl Triple {
    pub fn edge(subject: &BlankNode, predicate: &'static str, object: &BlankNode) -> Self {
        Self {
            subject: subject.clone(),
            predicate,
            object: Term::Node(object.clone()),
        }
    }

    pub fn literal(subject: &BlankNode, predicate: &'static str, value: impl Into<String>) -> Self {
        Self {
            subject: subject.clone(),
            predicate,
            object: Term::Literal(value.into()),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

/// The triples produced for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub triples: Vec<Triple>,
    pub new_actor: bool,
    pub new_object: bool,
}

impl Emission {
    /// The block as written to the sink, one statement per line.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.triples.len() * 48);
        for triple in &self.triples {
            let _ = writeln!(out, "{triple}");
        }
        out
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

/// Builds triple blocks. Stateless; all run state lives in the tracker.
#[derive(Debug, Default, Clone, Copy)]
pub struct TripleEmitter;

impl TripleEmitter {
    pub fn new() -> Self {
        Self
    }

    /// Emit the block for `record`, consulting and then updating `tracker`.
    ///
    /// Every field is validated before the tracker is touched, so a failing
    /// record leaves the tracker unchanged. `line` is only used for errors.
    pub fn emit(
        &self,
        record: &AuditRecord,
        tracker: &mut IdentityTracker,
        line: usize,
    ) -> Result<Emission> {
        let malformed = |e: FieldError| Error::MalformedInput {
            line,
            reason: e.to_string(),
        };

        let actor_id = record.identity_field(fields::ACTOR_ID).map_err(malformed)?;
        let object_id = record.identity_field(fields::OBJECT_ID).map_err(malformed)?;
        let event_id = record.text_field(fields::ID).map_err(malformed)?;
        if event_id.is_empty() {
            return Err(malformed(FieldError::Empty {
                field: fields::ID.into(),
            }));
        }
        let action = record.text_field(fields::ACTION).map_err(malformed)?;
        let hostname = record.text_field(fields::HOSTNAME).map_err(malformed)?;
        let object = record.text_field(fields::OBJECT).map_err(malformed)?;
        let pid = record.text_field(fields::PID).map_err(malformed)?;
        let ppid = record.text_field(fields::PPID).map_err(malformed)?;
        let timestamp = record.text_field(fields::TIMESTAMP).map_err(malformed)?;

        let actor = BlankNode::new(actor_id);
        let event = BlankNode::new(&event_id);
        let target = BlankNode::new(object_id);

        let new_actor = tracker.is_new_actor(actor_id);
        let new_object = tracker.is_new_object(object_id);

        let mut triples = Vec::with_capacity(11);
        if new_actor {
            triples.push(Triple::literal(&actor, predicates::ACTOR_ID, actor_id));
        }
        triples.push(Triple::edge(&actor, predicates::ACTION, &event));
        triples.push(Triple::literal(&event, predicates::ACTION_TYPE, action));
        triples.push(Triple::literal(&event, predicates::HOSTNAME, hostname));
        triples.push(Triple::edge(&event, predicates::ACTS_ON, &target));
        triples.push(Triple::literal(&event, predicates::ID, event_id));
        triples.push(Triple::literal(&target, predicates::OBJECT, object));
        triples.push(Triple::literal(&event, predicates::PID, pid));
        triples.push(Triple::literal(&event, predicates::PPID, ppid));
        triples.push(Triple::literal(&event, predicates::TIMESTAMP, timestamp));
        if new_object {
            triples.push(Triple::literal(&target, predicates::OBJECT_ID, object_id));
        }

        if new_actor {
            tracker.mark_actor(actor_id);
        }
        if new_object {
            tracker.mark_object(object_id);
        }

        Ok(Emission {
            triples,
            new_actor,
            new_object,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST: &str = r#"{"id":"e1","action":"open","actorID":"a1","objectID":"o1","object":"file.txt","hostname":"h","pid":"1","ppid":"0","timestamp":"T"}"#;
    const SECOND: &str = r#"{"id":"e2","action":"read","actorID":"a1","objectID":"o2","object":"other.txt","hostname":"h","pid":"1","ppid":"0","timestamp":"T2"}"#;

    fn emit(tracker: &mut IdentityTracker, json: &str) -> Emission {
        let record = AuditRecord::parse(json).unwrap();
        TripleEmitter::new().emit(&record, tracker, 1).unwrap()
    }

    fn count(emission: &Emission, predicate: &str) -> usize {
        emission
            .triples
            .iter()
            .filter(|t| t.predicate == predicate)
            .count()
    }

    #[test]
    fn first_record_declares_both_identities() {
        let mut tracker = IdentityTracker::new();
        let emission = emit(&mut tracker, FIRST);
        let text = emission.render();

        assert!(emission.new_actor && emission.new_object);
        assert_eq!(emission.len(), 11);
        assert!(text.contains("_:a1 <actorID> \"a1\" .\n"));
        assert!(text.contains("_:o1 <objectID> \"o1\" .\n"));
        assert!(text.contains("_:a1 <action> _:e1 .\n"));
        assert!(text.contains("_:e1 <acts_on> _:o1 .\n"));
        assert!(text.contains("_:o1 <object> \"file.txt\" .\n"));
    }

    #[test]
    fn exact_block_layout() {
        let mut tracker = IdentityTracker::new();
        let text = emit(&mut tracker, FIRST).render();
        let expected = "\
_:a1 <actorID> \"a1\" .
_:a1 <action> _:e1 .
_:e1 <action_type> \"open\" .
_:e1 <hostname> \"h\" .
_:e1 <acts_on> _:o1 .
_:e1 <id> \"e1\" .
_:o1 <object> \"file.txt\" .
_:e1 <pid> \"1\" .
_:e1 <ppid> \"0\" .
_:e1 <timestamp> \"T\" .
_:o1 <objectID> \"o1\" .
";
        assert_eq!(text, expected);
    }

    #[test]
    fn repeated_actor_is_not_redeclared() {
        let mut tracker = IdentityTracker::new();
        emit(&mut tracker, FIRST);
        let emission = emit(&mut tracker, SECOND);

        assert!(!emission.new_actor);
        assert!(emission.new_object);
        assert_eq!(count(&emission, predicates::ACTOR_ID), 0);
        assert_eq!(count(&emission, predicates::OBJECT_ID), 1);
        assert!(emission.render().contains("_:o2 <objectID> \"o2\" .\n"));
    }

    #[test]
    fn repeated_object_only() {
        let mut tracker = IdentityTracker::new();
        emit(&mut tracker, FIRST);
        let json = FIRST.replace("\"a1\"", "\"a9\"").replace("\"e1\"", "\"e9\"");
        let emission = emit(&mut tracker, &json);
        assert!(emission.new_actor);
        assert!(!emission.new_object);
        assert_eq!(count(&emission, predicates::ACTOR_ID), 1);
        assert_eq!(count(&emission, predicates::OBJECT_ID), 0);
    }

    #[test]
    fn fixed_triples_present_in_every_case() {
        let mut tracker = IdentityTracker::new();
        for json in [FIRST, SECOND, FIRST] {
            let emission = emit(&mut tracker, json);
            for predicate in [
                predicates::ACTION,
                predicates::ACTS_ON,
                predicates::ACTION_TYPE,
                predicates::HOSTNAME,
                predicates::ID,
                predicates::PID,
                predicates::PPID,
                predicates::TIMESTAMP,
                predicates::OBJECT,
            ] {
                assert_eq!(count(&emission, predicate), 1, "{predicate}");
            }
        }
        // Both identities already declared.
        let last = emit(&mut tracker, SECOND);
        assert_eq!(last.len(), 9);
    }

    #[test]
    fn numeric_pid_is_rendered_as_text() {
        let mut tracker = IdentityTracker::new();
        let json = FIRST.replace("\"pid\":\"1\"", "\"pid\":4312");
        let text = emit(&mut tracker, &json).render();
        assert!(text.contains("_:e1 <pid> \"4312\" .\n"));
    }

    #[test]
    fn missing_actor_fails_without_touching_tracker() {
        let mut tracker = IdentityTracker::new();
        let record = AuditRecord::parse(r#"{"id":"e1","objectID":"o1"}"#).unwrap();
        let err = TripleEmitter::new()
            .emit(&record, &mut tracker, 7)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInput { line: 7, .. }));
        assert!(err.to_string().contains("actorID"));
        assert_eq!(tracker.actors(), 0);
        assert_eq!(tracker.objects(), 0);
    }

    #[test]
    fn missing_literal_fails_before_marking() {
        let mut tracker = IdentityTracker::new();
        let json = FIRST.replace("\"hostname\":\"h\",", "");
        let record = AuditRecord::parse(&json).unwrap();
        assert!(TripleEmitter::new().emit(&record, &mut tracker, 1).is_err());
        assert!(tracker.is_new_actor("a1"));
        assert!(tracker.is_new_object("o1"));
    }

    #[test]
    fn non_string_object_id_is_malformed() {
        let mut tracker = IdentityTracker::new();
        let json = FIRST.replace("\"objectID\":\"o1\"", "\"objectID\":17");
        let record = AuditRecord::parse(&json).unwrap();
        let err = TripleEmitter::new()
            .emit(&record, &mut tracker, 3)
            .unwrap_err();
        assert!(err.to_string().contains("objectID"));
    }

    #[test]
    fn literals_are_escaped() {
        let subject = BlankNode::new("e1");
        let triple = Triple::literal(&subject, predicates::OBJECT, "C:\\tmp\\\"x\"\nnext");
        assert_eq!(
            triple.to_string(),
            r#"_:e1 <object> "C:\\tmp\\\"x\"\nnext" ."#
        );
        let ctrl = Triple::literal(&subject, predicates::OBJECT, "a\u{1}b");
        assert_eq!(ctrl.to_string(), r#"_:e1 <object> "a\u0001b" ."#);
    }

    #[test]
    fn blank_node_labels_are_stable_and_distinct() {
        assert_eq!(BlankNode::new("a1").label(), "a1");
        assert_eq!(
            BlankNode::new("6c0a-11eb").label(),
            BlankNode::new("6c0a-11eb").label()
        );
        assert_eq!(BlankNode::new("a b").label(), "a_20b");
        assert_eq!(BlankNode::new("a_b").label(), "a_5Fb");
        assert_ne!(BlankNode::new("a_20b"), BlankNode::new("a b"));
        assert_eq!(BlankNode::new("-x").label(), "_2Dx");
        assert_eq!(BlankNode::new("x.").label(), "x_2E");
    }
}
