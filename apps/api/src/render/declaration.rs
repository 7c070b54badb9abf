//! The per-holder declaration page.
//!
//! Positions are given in centimetres from the top-left of an A4 sheet and
//! converted to points at draw time.

use chrono::NaiveDate;

use crate::dmed::format::{format_brl, format_cpf, format_long_date_pt_br};
use crate::dmed::models::{Cpf, HolderRecord};
use crate::layout::font_metrics::{cm, PageConfig, HELVETICA};
use crate::layout::justify::justify_paragraph;
use crate::render::header_image::HeaderImage;
use crate::render::pdf::{Align, PdfCanvas, RenderError};

const TITLE: &str = "DECLARAÇÃO";
const TITLE_SIZE_PT: f32 = 16.0;
const BODY_SIZE_PT: f32 = 12.0;

const HEADER_WIDTH_CM: f32 = 21.0;
const HEADER_HEIGHT_CM: f32 = 3.88;
const TITLE_GAP_CM: f32 = 1.9;
const PARAGRAPH_GAP_CM: f32 = 2.0;

const MARGIN_LEFT_CM: f32 = 2.0;
const AMOUNT_RIGHT_CM: f32 = 19.0;
const CENTER_CM: f32 = 10.5;
const PARAGRAPH_WIDTH_CM: f32 = 16.8;
const LINE_HEIGHT_CM: f32 = 0.5;
const FIRST_LINE_INDENT_CM: f32 = 1.0;
const AFTER_PARAGRAPH_CM: f32 = 1.5;

const ROW_ADVANCE_CM: f32 = 1.0;
const DEPENDENT_CPF_ADVANCE_CM: f32 = 0.7;

const DATE_Y_CM: f32 = 25.0;
const SECTOR_Y_CM: f32 = 28.0;

/// Fixed description of the issuing health system, quoted in every declaration.
const ISSUER_DESCRIPTION: &str = "sistema Saúde Recife, CNPJ/MF nº05.244.336/0001-13, \
    sediado à Avenida Manoel Borba nº488, Boa Vista, Recife, Pernambuco CEP 50.070-000";

/// Values that vary per deployment or per day rather than per holder.
#[derive(Debug, Clone)]
pub struct DeclarationContext {
    pub year: i32,
    pub city: String,
    pub sector: String,
    pub issued_on: NaiveDate,
}

pub fn declaration_file_name(cpf: &Cpf) -> String {
    format!("declaracao_{cpf}.pdf")
}

pub fn declaration_paragraph(holder: &HolderRecord, year: i32) -> String {
    format!(
        "Declaramos para fins de apresentação à Receita Federal do Brasil que a senhora {} \
         portador do {}, é beneficiária titular do {ISSUER_DESCRIPTION}. E pagou no ano de \
         {year}, a título de contribuição ao sistema de saúde, à importância de {}.",
        holder.name(),
        format_cpf(holder.cpf()),
        format_brl(holder.total_amount()),
    )
}

/// Renders one holder's declaration into PDF bytes. CPU-bound; run it off the async runtime.
pub fn render_declaration(
    holder: &HolderRecord,
    header: &HeaderImage,
    ctx: &DeclarationContext,
) -> Result<Vec<u8>, RenderError> {
    let mut canvas = PdfCanvas::new(PageConfig::a4_portrait(), &HELVETICA);

    canvas.image(header, 0.0, 0.0, cm(HEADER_WIDTH_CM), cm(HEADER_HEIGHT_CM));

    let mut y = cm(HEADER_HEIGHT_CM + TITLE_GAP_CM);
    canvas.text(TITLE, cm(CENTER_CM), y, TITLE_SIZE_PT, Align::Center);
    y += cm(PARAGRAPH_GAP_CM);

    let body = canvas.font_at(BODY_SIZE_PT);
    let paragraph = justify_paragraph(
        &declaration_paragraph(holder, ctx.year),
        &body,
        cm(PARAGRAPH_WIDTH_CM),
        cm(LINE_HEIGHT_CM),
        cm(FIRST_LINE_INDENT_CM),
    );
    for line in &paragraph.lines {
        for word in &line.words {
            canvas.text(
                &word.text,
                cm(MARGIN_LEFT_CM) + word.x,
                y + line.y,
                BODY_SIZE_PT,
                Align::Left,
            );
        }
    }
    y += paragraph.height(cm(LINE_HEIGHT_CM)) + cm(AFTER_PARAGRAPH_CM);

    canvas.text(holder.name(), cm(MARGIN_LEFT_CM), y, BODY_SIZE_PT, Align::Left);
    canvas.text(
        &format_brl(holder.own_amount()),
        cm(AMOUNT_RIGHT_CM),
        y,
        BODY_SIZE_PT,
        Align::Right,
    );
    y += cm(ROW_ADVANCE_CM);

    for dep in holder.dependents() {
        canvas.text(&dep.name, cm(MARGIN_LEFT_CM), y, BODY_SIZE_PT, Align::Left);
        canvas.text(
            &format_brl(dep.amount),
            cm(AMOUNT_RIGHT_CM),
            y,
            BODY_SIZE_PT,
            Align::Right,
        );
        y += cm(DEPENDENT_CPF_ADVANCE_CM);
        canvas.text(&format_cpf(&dep.cpf), cm(MARGIN_LEFT_CM), y, BODY_SIZE_PT, Align::Left);
        y += cm(ROW_ADVANCE_CM);
    }

    // Trailer fields sit at fixed positions regardless of how long the listing ran.
    let date_line = format!("{}, {}", ctx.city, format_long_date_pt_br(ctx.issued_on));
    canvas.text(&date_line, cm(AMOUNT_RIGHT_CM), cm(DATE_Y_CM), BODY_SIZE_PT, Align::Right);
    canvas.text(&ctx.sector, cm(CENTER_CM), cm(SECTOR_Y_CM), BODY_SIZE_PT, Align::Center);

    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dmed::parser::parse_dmed;
    use crate::render::header_image::tests::png_bytes;
    use crate::render::pdf::encode_win_ansi;
    use lopdf::Document;

    fn holder() -> HolderRecord {
        parse_dmed(
            "TOP|11122233344|MARIA DA SILVA|5000|\n\
             DTOP|55566677788|20000101|JOAO DA SILVA|03|1000|\n\
             DTOP|99988877766|20050505|ANA DA SILVA|04|2000|",
        )
        .holders
        .remove(0)
    }

    fn ctx() -> DeclarationContext {
        DeclarationContext {
            year: 2025,
            city: "Recife".into(),
            sector: "Setor de Adesão e Exclusão".into(),
            issued_on: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        }
    }

    fn drawn_strings(bytes: &[u8]) -> Vec<Vec<u8>> {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        doc.get_and_decode_page_content(page_id)
            .unwrap()
            .operations
            .into_iter()
            .filter(|o| o.operator == "Tj")
            .map(|o| o.operands[0].as_str().unwrap().to_vec())
            .collect()
    }

    #[test]
    fn test_paragraph_interpolates_holder_fields() {
        let text = declaration_paragraph(&holder(), 2025);
        assert!(text.contains("senhora MARIA DA SILVA portador do 111.222.333-44,"));
        assert!(text.contains("no ano de 2025"));
        assert!(text.ends_with("à importância de R$ 80,00."));
    }

    #[test]
    fn test_file_name_uses_raw_cpf() {
        assert_eq!(
            declaration_file_name(holder().cpf()),
            "declaracao_11122233344.pdf"
        );
    }

    #[test]
    fn test_render_declaration_draws_all_sections() {
        let header = HeaderImage::decode(&png_bytes(8, 2)).unwrap();
        let bytes = render_declaration(&holder(), &header, &ctx()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let strings = drawn_strings(&bytes);
        let has = |s: &str| strings.contains(&encode_win_ansi(s));
        assert!(has("DECLARAÇÃO"));
        assert!(has("MARIA DA SILVA"));
        assert!(has("R$ 50,00"));
        assert!(has("JOAO DA SILVA"));
        assert!(has("R$ 10,00"));
        assert!(has("555.666.777-88"));
        assert!(has("ANA DA SILVA"));
        assert!(has("R$ 20,00"));
        assert!(has("Recife, 18 de outubro de 2026"));
        assert!(has("Setor de Adesão e Exclusão"));
        // paragraph words are drawn one by one
        assert!(has("Declaramos"));
        assert!(has("80,00."));
    }
}
