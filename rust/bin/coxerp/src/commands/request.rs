//! Production request commands.
//!
//! `coxerp create`, `coxerp transition REQ-20241125-001 in-production`, etc.
//! Every mutating command prints the request as it is after the change.

use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use coxerp_core::{ListParams, ListResult};
use coxerp_production::{
    NewRequest, ProductionRequest, RequestFilter, RequestSort, RequestStatus, SerialPatch,
    TransitionExtra, transitions,
};
use serde_json::json;

use super::Session;

fn status_cell(status: RequestStatus) -> String {
    format!("{} ({})", status, status.label())
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_request(req: &ProductionRequest) {
    println!("Request:   {}  (revision {})", req.request_no, req.revision);
    println!("Status:    {}", status_cell(req.status));
    println!("Client:    {}", req.client);
    println!("Model:     {} x{}", req.model, req.quantity);
    if let Some(supplier) = &req.lens_supplier {
        println!("Lens:      {}", supplier);
    }
    println!(
        "Dates:     requested {}  expected {}  out {}",
        req.request_date,
        date_cell(req.expected_date),
        date_cell(req.out_date)
    );
    for (label, text) in [
        ("Details", &req.details),
        ("Requests", &req.other_requests),
        ("Notes", &req.special_notes),
    ] {
        if !text.is_empty() {
            println!("{}:", label);
            for line in text.lines() {
                println!("  {}", line);
            }
        }
    }
    if let Some(att) = &req.attachment {
        println!("Attached:  {} ({}, {} bytes)", att.filename, att.mime_type, att.size);
    }

    if !req.serials.is_empty() {
        println!();
        println!(
            "Serials ({}/{} completed):",
            req.completed_count(),
            req.serials.len()
        );
        println!("  {:>4}  {:<20}  {:<4}  NOTE", "SEQ", "SERIAL NO", "DONE");
        for s in &req.serials {
            println!(
                "  {:>4}  {:<20}  {:<4}  {}",
                s.seq,
                if s.serial_no.is_empty() { "-" } else { s.serial_no.as_str() },
                if s.completed { "yes" } else { "no" },
                s.note
            );
        }
    }

    if !req.memos.is_empty() {
        println!();
        println!("Memos:");
        for m in &req.memos {
            println!("  [{}] {}: {}", m.timestamp.format("%Y-%m-%d %H:%M"), m.author, m.content);
        }
    }

    let next = transitions::targets_from(req.status);
    if !next.is_empty() {
        let next: Vec<_> = next.iter().map(|s| s.as_str()).collect();
        println!();
        println!("Next:      {}", next.join(", "));
    }
}

fn print_list(page: &ListResult<ProductionRequest>) {
    println!(
        "{:<18}  {:<20}  {:<22}  {:>4}  {:<20}  {:<10}",
        "REQUEST NO", "CLIENT", "MODEL", "QTY", "STATUS", "EXPECTED"
    );
    for req in &page.items {
        println!(
            "{:<18}  {:<20}  {:<22}  {:>4}  {:<20}  {:<10}",
            req.request_no,
            req.client,
            req.model,
            req.quantity,
            status_cell(req.status),
            date_cell(req.expected_date)
        );
    }
    println!(
        "{} shown, {} total{}",
        page.items.len(),
        page.total,
        if page.has_more { " (more with --offset)" } else { "" }
    );
}

pub fn create(session: &Session, input: NewRequest) -> Result<()> {
    let request_no = session.store.create(input)?;
    let req = session.store.get(&request_no)?;
    session.emit(&req, |req| {
        println!("Created {}.", req.request_no);
        println!();
        print_request(req);
    })
}

pub fn get(session: &Session, request_no: &str) -> Result<()> {
    let req = session.store.get(request_no)?;
    session.emit(&req, print_request)
}

pub fn list(
    session: &Session,
    filter: RequestFilter,
    sort: RequestSort,
    params: ListParams,
) -> Result<()> {
    let listing = session.store.list(filter)?;
    let page = listing.page(sort, &params)?;
    session.emit(&page, print_list)
}

pub fn transition(
    session: &Session,
    request_no: &str,
    target: &str,
    extra: TransitionExtra,
) -> Result<()> {
    let target: RequestStatus = target.parse()?;
    let req = session.store.transition(request_no, target, extra)?;
    session.emit(&req, print_request)
}

pub fn init_serials(session: &Session, request_no: &str) -> Result<()> {
    let added = session.store.initialize_serials(request_no)?;
    let req = session.store.get(request_no)?;
    session.emit(&req, |req| {
        if added {
            println!("Created {} serial rows.", req.serials.len());
        } else {
            println!("Serial table already present.");
        }
        println!();
        print_request(req);
    })
}

pub fn serial(session: &Session, request_no: &str, seq: u32, patch: SerialPatch) -> Result<()> {
    let entry = session.store.update_serial(request_no, seq, patch)?;
    session.emit(&entry, |e| {
        println!(
            "{} seq {}: serial no {:?}, completed {}, note {:?}",
            request_no, e.seq, e.serial_no, e.completed, e.note
        );
    })
}

pub fn finalize(session: &Session, request_no: &str, out_date: NaiveDate) -> Result<()> {
    let req = session.store.finalize(request_no, out_date)?;
    session.emit(&req, print_request)
}

pub fn memo(session: &Session, request_no: &str, author: &str, content: &str) -> Result<()> {
    let memo = session.store.add_memo(request_no, author, content)?;
    session.emit(&memo, |m| {
        println!("Memo added to {} at {}.", request_no, m.timestamp.to_rfc3339());
    })
}

pub fn attach(session: &Session, request_no: &str, file: &Path, mime_type: Option<&str>) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("{} has no file name", file.display()))?;
    let att = session.store.attach(request_no, &filename, mime_type, &data)?;
    session.emit(&json!({ "requestNo": request_no, "attachment": att }), |_| {
        println!(
            "Attached {} to {} ({} bytes, {}).",
            att.filename, request_no, att.size, att.mime_type
        );
    })
}

pub fn fetch_attachment(session: &Session, request_no: &str, out: &Path) -> Result<()> {
    let Some((att, bytes)) = session.store.attachment_bytes(request_no)? else {
        anyhow::bail!("{} has no attachment", request_no);
    };
    let target = if out.is_dir() { out.join(&att.filename) } else { out.to_path_buf() };
    std::fs::write(&target, &bytes)
        .with_context(|| format!("failed to write {}", target.display()))?;
    session.emit(&json!({ "attachment": att, "writtenTo": target }), |_| {
        println!("Wrote {} ({} bytes) to {}.", att.filename, bytes.len(), target.display());
    })
}
