use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::SheetError;

const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Style 1 is the bold header font.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

/// Spreadsheet column name for a zero-based index (0 -> A, 26 -> AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), SheetError> {
    writer
        .write_event(event)
        .map_err(|e| SheetError::Write(e.to_string()))
}

fn xml_decl<W: Write>(writer: &mut Writer<W>) -> Result<(), SheetError> {
    emit(
        writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )
}

fn workbook_xml(sheet_name: &str) -> Result<Vec<u8>, SheetError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    xml_decl(&mut writer)?;
    emit(
        &mut writer,
        Event::Start(
            BytesStart::new("workbook").with_attributes([("xmlns", SHEET_NS), ("xmlns:r", REL_NS)]),
        ),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("sheets")))?;
    emit(
        &mut writer,
        Event::Empty(BytesStart::new("sheet").with_attributes([
            ("name", sheet_name),
            ("sheetId", "1"),
            ("r:id", "rId1"),
        ])),
    )?;
    emit(&mut writer, Event::End(BytesEnd::new("sheets")))?;
    emit(&mut writer, Event::End(BytesEnd::new("workbook")))?;
    Ok(writer.into_inner().into_inner())
}

fn text_cell<W: Write>(
    writer: &mut Writer<W>,
    reference: &str,
    value: &str,
    bold: bool,
) -> Result<(), SheetError> {
    let mut cell = BytesStart::new("c").with_attributes([("r", reference), ("t", "inlineStr")]);
    if bold {
        cell.push_attribute(("s", "1"));
    }
    emit(writer, Event::Start(cell))?;
    emit(writer, Event::Start(BytesStart::new("is")))?;
    emit(
        writer,
        Event::Start(BytesStart::new("t").with_attributes([("xml:space", "preserve")])),
    )?;
    emit(writer, Event::Text(BytesText::new(value)))?;
    emit(writer, Event::End(BytesEnd::new("t")))?;
    emit(writer, Event::End(BytesEnd::new("is")))?;
    emit(writer, Event::End(BytesEnd::new("c")))
}

fn sheet_xml(headers: &[&str], rows: &[Vec<String>]) -> Result<Vec<u8>, SheetError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    xml_decl(&mut writer)?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("worksheet").with_attributes([("xmlns", SHEET_NS)])),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("sheetData")))?;

    let header_row = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    for (r, values) in std::iter::once(&header_row).chain(rows.iter()).enumerate() {
        let row_number = (r + 1).to_string();
        emit(
            &mut writer,
            Event::Start(BytesStart::new("row").with_attributes([("r", row_number.as_str())])),
        )?;
        for (c, value) in values.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), row_number);
            text_cell(&mut writer, &reference, value, r == 0)?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("row")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("sheetData")))?;
    emit(&mut writer, Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner().into_inner())
}

/// Build a one-sheet workbook with a bold header row. Every cell is text
/// so NIK/KK digits are kept verbatim.
pub fn write_workbook(
    sheet_name: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<Vec<u8>, SheetError> {
    let parts: [(&str, Vec<u8>); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
        ("_rels/.rels", ROOT_RELS.as_bytes().to_vec()),
        ("xl/workbook.xml", workbook_xml(sheet_name)?),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes().to_vec()),
        ("xl/styles.xml", STYLES.as_bytes().to_vec()),
        ("xl/worksheets/sheet1.xml", sheet_xml(headers, rows)?),
    ];

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in parts {
        zip.start_file(name, options)
            .map_err(|e| SheetError::Write(e.to_string()))?;
        zip.write_all(&bytes)?;
    }
    let cursor = zip.finish().map_err(|e| SheetError::Write(e.to_string()))?;
    Ok(cursor.into_inner())
}
