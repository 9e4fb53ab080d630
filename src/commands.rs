use crate::report;
use crate::terminal::{TerminalView, attachment_line};
use desk_cache::{Filter, Query, RemotePush, Stats, format_size};
use desk_config::Settings;
use desk_library::Desk;
use desk_library::intake::{IntakeEvent, Target};
use desk_models::{AttachmentId, ComplaintId, DocumentType};
use desk_sync::SyncEvent;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Wait for background pushes so the remote mirror is written before exit.
async fn settle(pushes: Vec<RemotePush>) {
    if pushes.is_empty() {
        return;
    }
    let landed = futures::future::join_all(pushes.into_iter().map(RemotePush::settled)).await;
    if !landed.into_iter().any(|landed| landed) {
        tracing::warn!("Remote mirror not updated; it will catch up from the next change");
    }
}

pub(crate) async fn list(desk: &Desk, complaint: Option<&ComplaintId>, filter: Filter, search: Option<&str>) -> miette::Result<()> {
    let query = match search {
        Some(term) => Query::new(filter).with_search(term),
        None => Query::new(filter),
    };
    let records = match complaint {
        Some(complaint) => desk.attachments_for(Some(complaint), &query).await,
        None => desk.attachments(&query).await,
    }
    .map_err(report)?;
    for record in &records {
        println!("{}", attachment_line(record));
    }
    let stats = Stats::of(&records);
    eprintln!(
        "{} attachments, {} ({} before, {} after, {} other images, {} documents)",
        stats.total,
        format_size(stats.total_bytes),
        stats.before,
        stats.after,
        stats.neutral_images,
        stats.documents,
    );
    Ok(())
}

pub(crate) async fn count(desk: &Desk, complaint: &ComplaintId) -> miette::Result<()> {
    println!("{}", desk.count_for(Some(complaint)).await.map_err(report)?);
    Ok(())
}

pub(crate) async fn complaints(desk: &Desk) -> miette::Result<()> {
    for row in desk.complaints().await.map_err(report)? {
        let reference = row.reference.as_ref().map(|r| r.as_str()).unwrap_or("-");
        let supervisor = row.supervisor.as_deref().unwrap_or("-");
        println!("{:<20}  {reference:<10}  {:<10}  {:>3}  {}  [{supervisor}]", row.id, row.status, row.attachments, row.customer);
    }
    Ok(())
}

pub(crate) async fn intake(
    desk: &Desk,
    complaint: Option<ComplaintId>,
    document_type: DocumentType,
    files: Vec<PathBuf>,
) -> miette::Result<()> {
    let target = Target::new(complaint, document_type);
    let mut events = desk.intake(target, files).await.map_err(report)?.boxed();
    let mut pushes = Vec::new();
    while let Some(event) = events.next().await {
        match event {
            IntakeEvent::Started { files } => tracing::info!(files, "Intake started"),
            IntakeEvent::Accepted { record, push } => {
                println!("{}", attachment_line(&record));
                pushes.push(push);
            },
            IntakeEvent::Rejected { path, error } => {
                let reason = error.to_string();
                eprintln!("skipped {}: {reason}", path.display());
            },
            IntakeEvent::Complete { accepted, rejected } => eprintln!("{accepted} attached, {rejected} skipped"),
        }
    }
    settle(pushes).await;
    Ok(())
}

pub(crate) async fn remove(desk: &Desk, id: &AttachmentId) -> miette::Result<()> {
    match desk.remove(id).await.map_err(report)? {
        Some(push) => {
            settle(vec![push]).await;
            eprintln!("removed {id}");
        },
        None => eprintln!("no attachment {id}"),
    }
    Ok(())
}

pub(crate) async fn download(desk: &Desk, id: &AttachmentId, destination: &Path) -> miette::Result<()> {
    let written = desk.download(id, destination).await.map_err(report)?;
    println!("{}", written.display());
    Ok(())
}

pub(crate) async fn export(desk: &Desk, id: &AttachmentId) -> miette::Result<()> {
    desk.export_one(id).await.map_err(report)?;
    Ok(())
}

pub(crate) async fn export_all(desk: &Desk) -> miette::Result<()> {
    desk.export_all().await.map_err(report)?;
    Ok(())
}

pub(crate) async fn import(desk: &Desk) -> miette::Result<()> {
    let (record, push) = desk.paste_one().await.map_err(report)?;
    settle(vec![push]).await;
    eprintln!("imported {}", attachment_line(&record));
    Ok(())
}

pub(crate) async fn import_many(desk: &Desk) -> miette::Result<()> {
    let (summary, push) = desk.paste_many().await.map_err(report)?;
    settle(vec![push]).await;
    eprintln!(
        "imported {} attachments ({} before, {} after, {} linked to complaints)",
        summary.total, summary.before, summary.after, summary.linked
    );
    Ok(())
}

pub(crate) async fn watch(desk: &Desk, settings: &Settings, complaint: Option<ComplaintId>) -> miette::Result<()> {
    desk.select(complaint).await.map_err(report)?;
    let reconciler = desk
        .reconciler(Arc::new(TerminalView))
        .await
        .map_err(report)?
        .with_render_delay(settings.sync.render_delay())
        .with_directory_paths(&settings.remote.complaints, &settings.remote.supervisors);
    let mut events = reconciler.events();
    let task = reconciler.start();

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    loop {
        tokio::select! {
            _ = &mut interrupted => break,
            event = events.recv() => match event {
                Ok(SyncEvent::Failed { collection, message }) => tracing::warn!(%collection, reason = %message, "Sync failed"),
                Ok(event) => tracing::debug!(?event, "Sync event"),
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "Sync events dropped"),
                Err(RecvError::Closed) => break,
            },
        }
    }
    task.stop().await.map_err(report)?;
    eprintln!("stopped");
    Ok(())
}
