use desk_cache::format_size;
use desk_models::AttachmentRecord;
use desk_sync::{Frame, View};

pub(crate) fn attachment_line(record: &AttachmentRecord) -> String {
    let reference = record.complaint_reference.as_ref().map(|r| r.as_str()).unwrap_or("-");
    format!(
        "{id}  {kind:<8}  {size:>10}  {reference:<10}  {name}",
        id = record.id,
        kind = record.document_type,
        size = format_size(record.size_bytes),
        name = record.name,
    )
}

/// Prints every frame to stdout.
pub(crate) struct TerminalView;

impl View for TerminalView {
    fn render(&self, frame: &Frame) {
        let attachments = frame.attachments();
        match (&frame.selection, frame.complaint()) {
            (None, _) => println!("-- no complaint selected ({} attachments cached)", frame.records.len()),
            (Some(_), Some(complaint)) => {
                let reference = frame.reference.as_ref().map(|r| r.as_str()).unwrap_or("-");
                println!("-- {reference} {} ({} attachments)", complaint.customer_display_name(), attachments.len());
            },
            (Some(id), None) => println!("-- {id} ({} attachments)", attachments.len()),
        }
        for record in attachments {
            println!("{}", attachment_line(record));
        }
    }
}
