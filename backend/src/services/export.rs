//! Export Projector.
//!
//! Projects the detail payload of any overview into string grids and writes
//! them as an `.xlsx` workbook. Works only through [`TabularOverview`], so it
//! never needs to know which concrete report it was handed.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use log::debug;
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::ExportError;
use crate::overview::{DetailPayload, DetailRow, TabularOverview};

/// Rows of rendered cells; row 0 is the title row when titles exist.
pub type Grid = Vec<Vec<String>>;

/// One sheet's worth of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedGrid {
    pub name: String,
    pub grid: Grid,
}

/// Sheets in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<NamedGrid>,
}

impl Workbook {
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

const MAX_SHEET_NAME: usize = 31;
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

fn single_grid(titles: &[String], rows: &[&dyn DetailRow]) -> Grid {
    let mut grid = Vec::with_capacity(rows.len() + 1);
    if !titles.is_empty() {
        grid.push(titles.to_vec());
    }
    grid.extend(rows.iter().map(|row| row.cells()));
    grid
}

/// Project a flat detail list into one grid.
///
/// Absent or empty details give the title row alone, or nothing when there
/// are no titles. Grouped details have no single-grid form.
pub fn to_grid(overview: &dyn TabularOverview) -> Result<Grid, ExportError> {
    let titles = overview.titles();
    match overview.details() {
        None => Ok(single_grid(titles, &[])),
        Some(DetailPayload::Flat(rows)) => Ok(single_grid(titles, &rows)),
        Some(DetailPayload::Grouped(_)) => Err(ExportError::GroupedDetails),
    }
}

/// Project details into named grids: one per group for grouped details,
/// a single grid named `sheet_title` for a non-empty flat list, none when
/// there is nothing to show.
pub fn to_grids(overview: &dyn TabularOverview, sheet_title: &str) -> Vec<NamedGrid> {
    let titles = overview.titles();
    match overview.details() {
        None => Vec::new(),
        Some(DetailPayload::Flat(rows)) if rows.is_empty() => Vec::new(),
        Some(DetailPayload::Flat(rows)) => vec![NamedGrid {
            name: sheet_title.to_string(),
            grid: single_grid(titles, &rows),
        }],
        Some(DetailPayload::Grouped(groups)) => groups
            .into_iter()
            .map(|(name, rows)| NamedGrid {
                name: name.to_string(),
                grid: single_grid(titles, &rows),
            })
            .collect(),
    }
}

pub fn to_workbook(overview: &dyn TabularOverview, sheet_title: &str) -> Workbook {
    Workbook {
        sheets: to_grids(overview, sheet_title),
    }
}

/// `<analysisName>-<epochMillis>.xlsx`
pub fn export_file_name(analysis_name: &str, epoch_millis: i64) -> String {
    let stem: String = analysis_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}-{}.xlsx", stem, epoch_millis)
}

/// Make a sheet name Excel accepts: forbidden characters replaced, at most
/// 31 characters, never blank.
pub fn sanitize_sheet_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        fallback.chars().take(MAX_SHEET_NAME).collect()
    } else {
        cleaned
    }
}

/// Sanitize every name and suffix repeats with ` (n)`. Excel compares sheet
/// names case-insensitively.
fn unique_sheet_names(sheets: &[NamedGrid], default_title: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(sheets.len());
    for (i, sheet) in sheets.iter().enumerate() {
        let fallback = if sheets.len() == 1 && !default_title.trim().is_empty() {
            default_title.to_string()
        } else {
            format!("Sheet{}", i + 1)
        };
        let base = sanitize_sheet_name(&sheet.name, &fallback);
        let mut candidate = base.clone();
        let mut n = 2;
        while !seen.insert(candidate.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }
        names.push(candidate);
    }
    names
}

/// Spreadsheet column letters for a zero-based index: 0 -> A, 26 -> AA.
fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        XML_HEADER, NS_REL
    )
}

fn workbook_xml(names: &[String]) -> String {
    let mut xml = format!(
        r#"{}<workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
        XML_HEADER, NS_MAIN, NS_REL
    );
    for (i, name) in names.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(name.as_str()),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        XML_HEADER
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i, NS_REL, i
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn sheet_xml(grid: &Grid) -> String {
    let mut xml = format!(r#"{}<worksheet xmlns="{}"><sheetData>"#, XML_HEADER, NS_MAIN);
    for (r, row) in grid.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in row.iter().enumerate() {
            xml.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_name(c),
                r + 1,
                escape(value.as_str())
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Write `workbook` as an `.xlsx` archive.
///
/// A workbook with no sheets is written with one blank sheet named
/// `default_title`, since a spreadsheet needs at least one.
pub fn write_workbook<W: Write + Seek>(
    workbook: &Workbook,
    default_title: &str,
    writer: W,
) -> Result<W, ExportError> {
    let blank;
    let sheets: &[NamedGrid] = if workbook.sheets.is_empty() {
        blank = [NamedGrid {
            name: default_title.to_string(),
            grid: Vec::new(),
        }];
        &blank
    } else {
        &workbook.sheets
    };
    let names = unique_sheet_names(sheets, default_title);

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(content_types_xml(sheets.len()).as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(root_rels_xml().as_bytes())?;
    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml(&names).as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(workbook_rels_xml(sheets.len()).as_bytes())?;
    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(sheet_xml(&sheet.grid).as_bytes())?;
    }

    Ok(zip.finish()?)
}

/// Write `workbook` to `path`, creating parent directories as needed.
pub fn write_workbook_file(
    workbook: &Workbook,
    default_title: &str,
    path: &Path,
) -> Result<PathBuf, ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = BufWriter::new(File::create(path)?);
    let mut file = write_workbook(workbook, default_title, file)?;
    file.flush()?;
    debug!(
        "Wrote workbook with {} sheet(s) to {}",
        workbook.sheets.len().max(1),
        path.display()
    );
    Ok(path.to_path_buf())
}
