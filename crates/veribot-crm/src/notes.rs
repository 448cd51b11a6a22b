use crate::types::ConversationSummary;

/// Render a `ConversationSummary` as an HTML note body for attachment to a
/// CRM lead/contact record.
pub fn summary_to_html(summary: &ConversationSummary) -> String {
    let mut lines = vec![
        format!("<b>Purchase Intent:</b> {}", summary.purchase_intent),
        format!("<b>Urgency:</b> {}", summary.urgency_level),
        format!("<b>Sentiment:</b> {}", summary.sentiment_score),
    ];
    if let Some(budget) = &summary.detected_budget {
        lines.push(format!("<b>Budget:</b> {budget}"));
    }
    lines.push(format!("<b>Summary:</b><br>{}", summary.ai_summary.replace('\n', "<br>")));
    if !summary.client_description.is_empty() {
        lines.push(format!("<b>Client Description:</b><br>{}", summary.client_description.replace('\n', "<br>")));
    }
    if let (Some(start), Some(end)) = (&summary.conversation_start, &summary.conversation_end) {
        lines.push(format!("<b>Conversation:</b> {start} – {end}"));
    }
    lines.join("<br><br>")
}
