//! Per-hop stream accumulators.

use serde_json::Value;
use tracing::warn;

use rivulet_core::chat::{
    AdditionalContent, CitationKind, CitationPart, CitationRecord, ToolCall,
};
use rivulet_core::error::Error;

/// The kind of content block currently open, when one is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Text,
    ToolUse,
    Thinking,
}

/// One in-flight tool call, keyed by its content-block index.
#[derive(Debug, Default)]
pub(crate) struct ToolCallSlot {
    pub id: String,
    pub name: String,
    /// JSON argument fragments concatenated across delta events.
    pub partial_input: String,
}

/// Accumulators for one streaming hop. Rebuilt from zero on every hop
/// so nothing leaks across tool-call round trips.
#[derive(Debug, Default)]
pub(crate) struct StreamState {
    pub text: String,
    pub thinking: String,
    pub thinking_signature: String,
    /// Insertion-ordered; block indices need not be contiguous.
    pub tool_calls: Vec<(u32, ToolCallSlot)>,
    pub citations: Vec<CitationPart>,
    pub block_kind: Option<BlockKind>,
    pub block_index: Option<u32>,
    /// A decoded citation waiting to be bound to the next text delta.
    pub pending_citation: Option<CitationRecord>,
    pub stop_reason: Option<String>,
    pub model: String,
    pub request_id: String,
}

impl StreamState {
    /// Opens a tool-call slot at the given block index, replacing any
    /// slot already announced at that index.
    pub(crate) fn start_tool_call(&mut self, index: u32, id: String, name: String) {
        let slot = ToolCallSlot {
            id,
            name,
            partial_input: String::new(),
        };
        if let Some(existing) = self.slot_mut(index) {
            *existing = slot;
        } else {
            self.tool_calls.push((index, slot));
        }
    }

    pub(crate) fn slot_mut(&mut self, index: u32) -> Option<&mut ToolCallSlot> {
        self.tool_calls
            .iter_mut()
            .find(|(i, _)| *i == index)
            .map(|(_, slot)| slot)
    }

    pub(crate) fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Finalizes the accumulated tool calls in insertion order.
    ///
    /// Each slot's partial JSON is decoded into an argument object; a
    /// slot whose input fails to parse is surfaced with empty arguments
    /// rather than dropped.
    pub(crate) fn finalize_tool_calls(&self) -> Vec<ToolCall> {
        self.tool_calls
            .iter()
            .map(|(_, slot)| {
                let arguments = match serde_json::from_str::<Value>(&slot.partial_input) {
                    Ok(Value::Object(map)) => map,
                    Ok(_) | Err(_) => {
                        if !slot.partial_input.is_empty() {
                            warn!(
                                tool = %slot.name,
                                "tool call input was not a valid JSON object; using empty arguments"
                            );
                        }
                        serde_json::Map::new()
                    }
                };
                ToolCall {
                    id: slot.id.clone(),
                    name: slot.name.clone(),
                    arguments,
                }
            })
            .collect()
    }

    /// Builds the additional-content bag for the turn, or `None` when
    /// nothing accumulated.
    pub(crate) fn additional_content(&self) -> Option<AdditionalContent> {
        let bag = AdditionalContent {
            thinking: (!self.thinking.is_empty()).then(|| self.thinking.clone()),
            thinking_signature: (!self.thinking_signature.is_empty())
                .then(|| self.thinking_signature.clone()),
            citations: self.citations.clone(),
            citation_index: None,
        };
        (!bag.is_empty()).then_some(bag)
    }
}

/// Tags a streamed citation object by its positional signature.
///
/// Probes `start_page_number`, `start_char_index`, then
/// `start_block_index`; a record matching none of them is rejected.
pub(crate) fn decode_citation(raw: &Value) -> Result<CitationRecord, Error> {
    let kind = if raw.get("start_page_number").is_some() {
        CitationKind::PageLocation
    } else if raw.get("start_char_index").is_some() {
        CitationKind::CharLocation
    } else if raw.get("start_block_index").is_some() {
        CitationKind::ContentBlockLocation
    } else {
        return Err(Error::InvalidCitation { raw: raw.clone() });
    };
    Ok(CitationRecord {
        kind,
        raw: raw.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_accumulation() {
        let mut state = StreamState::default();
        state.start_tool_call(1, "toolu_01".into(), "search".into());
        state
            .slot_mut(1)
            .unwrap()
            .partial_input
            .push_str("{\"query\":");
        state
            .slot_mut(1)
            .unwrap()
            .partial_input
            .push_str("\"rust\"}");

        let calls = state.finalize_tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "toolu_01");
        assert_eq!(calls[0].arguments["query"], "rust");
    }

    #[test]
    fn test_finalize_preserves_insertion_order() {
        let mut state = StreamState::default();
        state.start_tool_call(5, "toolu_b".into(), "weather".into());
        state.start_tool_call(2, "toolu_a".into(), "search".into());

        let calls = state.finalize_tool_calls();
        assert_eq!(calls[0].id, "toolu_b");
        assert_eq!(calls[1].id, "toolu_a");
    }

    #[test]
    fn test_finalize_bad_json_yields_empty_arguments() {
        let mut state = StreamState::default();
        state.start_tool_call(0, "toolu_01".into(), "search".into());
        state.slot_mut(0).unwrap().partial_input.push_str("{\"q\": tru");

        let calls = state.finalize_tool_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].arguments.is_empty());
    }

    #[test]
    fn test_finalize_empty_input_yields_empty_arguments() {
        let mut state = StreamState::default();
        state.start_tool_call(0, "toolu_01".into(), "no_args".into());

        let calls = state.finalize_tool_calls();
        assert!(calls[0].arguments.is_empty());
    }

    #[test]
    fn test_restart_replaces_slot_at_index() {
        let mut state = StreamState::default();
        state.start_tool_call(0, "toolu_01".into(), "search".into());
        state.slot_mut(0).unwrap().partial_input.push_str("{\"a\":1}");
        state.start_tool_call(0, "toolu_02".into(), "weather".into());

        let calls = state.finalize_tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "toolu_02");
        assert!(calls[0].arguments.is_empty());
    }

    #[test]
    fn test_additional_content_empty_when_nothing_accumulated() {
        assert!(StreamState::default().additional_content().is_none());
    }

    #[test]
    fn test_additional_content_bag() {
        let mut state = StreamState {
            thinking: "reasoning".into(),
            thinking_signature: "sig".into(),
            ..Default::default()
        };
        state.citations.push(CitationPart {
            text: "cited".into(),
            citation: CitationRecord {
                kind: CitationKind::PageLocation,
                raw: json!({"start_page_number": 1}),
            },
        });

        let bag = state.additional_content().unwrap();
        assert_eq!(bag.thinking.as_deref(), Some("reasoning"));
        assert_eq!(bag.thinking_signature.as_deref(), Some("sig"));
        assert_eq!(bag.citations.len(), 1);
    }

    #[test]
    fn test_decode_citation_page_location() {
        let record =
            decode_citation(&json!({"start_page_number": 1, "end_page_number": 2})).unwrap();
        assert_eq!(record.kind, CitationKind::PageLocation);
        assert_eq!(record.raw["end_page_number"], 2);
    }

    #[test]
    fn test_decode_citation_char_location() {
        let record = decode_citation(&json!({"start_char_index": 10})).unwrap();
        assert_eq!(record.kind, CitationKind::CharLocation);
    }

    #[test]
    fn test_decode_citation_block_location() {
        let record = decode_citation(&json!({"start_block_index": 0})).unwrap();
        assert_eq!(record.kind, CitationKind::ContentBlockLocation);
    }

    #[test]
    fn test_decode_citation_probe_order_prefers_page() {
        let record =
            decode_citation(&json!({"start_page_number": 1, "start_char_index": 10})).unwrap();
        assert_eq!(record.kind, CitationKind::PageLocation);
    }

    #[test]
    fn test_decode_citation_unrecognized_is_error() {
        let err = decode_citation(&json!({"cited_text": "x"})).unwrap_err();
        assert!(matches!(err, Error::InvalidCitation { .. }));
    }
}
