use chrono::NaiveDateTime;

use super::{Align, Block, Cell, Run, Table};
use crate::dates::{format_display_date, DISPLAY_FORMAT, NOT_AVAILABLE};
use crate::form::{FormState, HazardDetail};
use crate::model::{ContactBundle, HazardDefinition};
use crate::reference::ReferenceTables;
use crate::taxonomy::MISSING_LINK;

pub const REPORT_TITLE: &str = "Safety Report";
pub const REPORT_SUBTITLE: &str = "Hazard Identification Process in Areas";
const DISTRIBUTION: &str = "CMS Safety, Activity Responsible, TSO.";

const ISO_DEFINITION: &str = "According to ISO 45001 a hazard is defined as a source capable of \
causing injury and ill health. Hazards can include sources with the potential to cause harm or \
hazardous situations, or circumstances with the potential for exposure leading to injury and ill \
health.";
const ISO_LINK: &str = "https://www.iso.org/obp/ui/fr/#iso:std:iso:45001:ed-1:v1:en";
const HSE_GUIDELINE_LINK: &str = "https://edms.cern.ch/document/1114042";

/// Placeholder some drafts carry in `recommendations`; treated as empty.
const NO_MEASURES_PLACEHOLDER: &str = "No specific safety measures available.";

const FALLBACK_CONTACTS_WARNING: &str = "Warning: the contact list could not be read from the \
reference workbook. The built-in contacts below may be out of date.";

const CHECK_MARK: &str = "X";
const CHECK_HEADER: &str = "Check";

/// Everything the assembler reads.
pub struct ReportContext<'a> {
    pub form: &'a FormState,
    pub definitions: &'a [HazardDefinition],
    pub contacts: &'a ContactBundle,
    pub tables: &'a ReferenceTables,
    pub generated_at: NaiveDateTime,
}

fn or_na(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

fn label_value(label: &str, value: impl Into<Cell>) -> Vec<Cell> {
    vec![Cell(vec![Run::bold(label)]), value.into()]
}

fn creator_line(form: &FormState) -> String {
    let name = form.creator_name.trim();
    let department = form.creator_department.trim();
    match (name.is_empty(), department.is_empty()) {
        (true, true) => NOT_AVAILABLE.to_string(),
        (false, true) => name.to_string(),
        (true, false) => format!("({department})"),
        (false, false) => format!("{name} ({department})"),
    }
}

/// Recommendation shown for a selected sub-hazard.
///
/// First non-empty of: the user's text, the detail's default
/// recommendation, the category's default recommendation, the generic
/// recommendation.
pub fn resolve_recommendation(
    detail: &HazardDetail,
    category: &str,
    tables: &ReferenceTables,
) -> String {
    let user = detail.recommendations.trim();
    if !user.is_empty() && user != NO_MEASURES_PLACEHOLDER {
        return user.to_string();
    }
    let default = detail.default_recommendations.trim();
    if !default.is_empty() && default != NO_MEASURES_PLACEHOLDER {
        return default.to_string();
    }
    tables.category_recommendation(category).to_string()
}

fn title_block(form: &FormState, blocks: &mut Vec<Block>) {
    blocks.push(Block::Title(REPORT_TITLE.to_string()));
    blocks.push(Block::Paragraph {
        runs: vec![Run::bold(REPORT_SUBTITLE)],
        align: Align::Center,
    });
    if !form.title.trim().is_empty() {
        blocks.push(Block::centered(form.title.trim()));
    }
    blocks.push(Block::centered(format!(
        "Building {}/{} {}",
        or_na(&form.building),
        or_na(&form.room),
        or_na(&form.location)
    )));
    blocks.push(Block::Table(Table {
        header: vec![
            "Prepared by:".into(),
            "Checked by:".into(),
            "Approved by:".into(),
        ],
        rows: vec![vec![creator_line(form).into(), "".into(), "".into()]],
    }));
    blocks.push(Block::paragraph(vec![
        Run::bold("Distribution to: "),
        Run::plain(DISTRIBUTION),
    ]));
    blocks.push(Block::PageBreak);
}

fn history(generated_at: NaiveDateTime, blocks: &mut Vec<Block>) {
    blocks.push(Block::heading(1, "History of changes"));
    blocks.push(Block::Table(Table {
        header: vec!["Rev.".into(), "Date".into(), "Description of changes".into()],
        rows: vec![vec![
            "0.1".into(),
            generated_at.format(DISPLAY_FORMAT).to_string().into(),
            "Creation of the document".into(),
        ]],
    }));
    blocks.push(Block::PageBreak);
}

fn activity_information(form: &FormState, blocks: &mut Vec<Block>) {
    blocks.push(Block::heading(1, "1 ACTIVITY SUMMARY INFORMATION"));
    let rows = vec![
        label_value("Title", or_na(&form.title)),
        label_value("Prepared by", creator_line(form)),
        label_value("Activity responsible", or_na(&form.responsible_person)),
        label_value("Estimated number of participants", or_na(&form.participant_count)),
        label_value("Start date", format_display_date(&form.start_date)),
        label_value("Estimated end date", format_display_date(&form.end_date)),
        label_value("Site", or_na(&form.location)),
        label_value("Building", or_na(&form.building)),
        label_value("Room", or_na(&form.room)),
        label_value("Location details", or_na(&form.location_details)),
        label_value("CERN specific support (group)", or_na(&form.cern_support)),
        label_value("CMS specific support", or_na(&form.cms_support)),
    ];
    blocks.push(Block::Table(Table {
        header: Vec::new(),
        rows,
    }));
}

fn description(form: &FormState, blocks: &mut Vec<Block>) {
    blocks.push(Block::heading(1, "2 DESCRIPTION OF THE ACTIVITY"));
    blocks.push(Block::text(or_na(&form.activity_description)));
    blocks.push(Block::paragraph(vec![
        Run::plain("For the section below, please have a look at this HSE guideline: "),
        Run::link(HSE_GUIDELINE_LINK, HSE_GUIDELINE_LINK),
    ]));
    blocks.push(Block::PageBreak);
}

fn reference_cell(link: &str) -> Cell {
    if link.trim().is_empty() || link == MISSING_LINK {
        return Cell::from(MISSING_LINK);
    }
    let mut runs = Vec::new();
    for (i, url) in link.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
        if i > 0 {
            runs.push(Run::plain("\n"));
        }
        runs.push(Run::link(url, url));
    }
    Cell(runs)
}

fn definitions(ctx: &ReportContext<'_>, blocks: &mut Vec<Block>) {
    let tables = ctx.tables;
    let selected_keys: Vec<String> = ctx
        .form
        .selected_hazards
        .iter()
        .map(|c| tables.normalize_category(c))
        .collect();

    blocks.push(Block::heading(1, "3 HAZARDS DEFINITIONS"));
    blocks.push(Block::paragraph(vec![Run::italic(ISO_DEFINITION)]));
    blocks.push(Block::paragraph(vec![Run::link("ISO 45001", ISO_LINK)]));

    let summary = if selected_keys.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        selected_keys
            .iter()
            .map(|k| tables.display_name(k))
            .collect::<Vec<_>>()
            .join(", ")
    };
    blocks.push(Block::paragraph(vec![
        Run::bold("Selected hazard categories: "),
        Run::plain(summary),
    ]));

    if ctx.definitions.is_empty() {
        blocks.push(Block::text(NOT_AVAILABLE));
        return;
    }
    let rows: Vec<Vec<Cell>> = ctx
        .definitions
        .iter()
        .map(|d| {
            let checked = selected_keys.contains(&tables.normalize_category(&d.hazard));
            vec![
                d.section.clone().into(),
                Cell(vec![Run::bold(d.hazard.clone())]),
                or_na(&d.definition).into(),
                reference_cell(&d.reference_link),
                if checked { CHECK_MARK } else { "" }.into(),
            ]
        })
        .collect();
    blocks.push(Block::Table(Table {
        header: vec![
            "§".into(),
            "Hazard".into(),
            "Definition".into(),
            "Reference".into(),
            CHECK_HEADER.into(),
        ],
        rows,
    }));
}

fn hazard_details(ctx: &ReportContext<'_>, blocks: &mut Vec<Block>) {
    blocks.push(Block::PageBreak);
    blocks.push(Block::heading(1, "4 IDENTIFICATION OF THE HAZARDS FOR YOUR ACTIVITY"));
    let form = ctx.form;
    if form.selected_hazards.is_empty() {
        blocks.push(Block::text("No hazard categories selected."));
        return;
    }

    for category in &form.selected_hazards {
        blocks.push(Block::heading(2, category.clone()));
        let selected = form.selected_details(category);
        if selected.is_empty() {
            tracing::debug!(category, "selected category has no selected sub-hazards");
            blocks.push(Block::text(NOT_AVAILABLE));
            continue;
        }
        let rows: Vec<Vec<Cell>> = selected
            .into_iter()
            .map(|(id, detail)| {
                vec![
                    Cell(vec![Run::bold(detail.display_name(id))]),
                    or_na(&detail.details).into(),
                    resolve_recommendation(detail, category, ctx.tables).into(),
                ]
            })
            .collect();
        blocks.push(Block::Table(Table {
            header: vec![
                "Subject".into(),
                "Details".into(),
                "Recommendations".into(),
            ],
            rows,
        }));
    }
}

fn attachments(form: &FormState) -> String {
    if form.uploaded_files.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    form.uploaded_files
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn supporting_documents(form: &FormState, blocks: &mut Vec<Block>) {
    blocks.push(Block::heading(1, "5 SUPPORTING DOCUMENTS"));
    let rows = vec![
        label_value("Safety file", or_na(&form.safety_documents)),
        label_value("Technical documents", or_na(&form.technical_documents)),
        label_value("Other useful documents", or_na(&form.other_documents)),
        label_value("HSE support", or_na(&form.hse_support)),
        label_value("Reference documents", or_na(&form.reference_documents)),
        label_value("Attached files", attachments(form)),
    ];
    blocks.push(Block::Table(Table {
        header: Vec::new(),
        rows,
    }));
}

fn contacts(bundle: &ContactBundle, blocks: &mut Vec<Block>) {
    blocks.push(Block::heading(1, "6 CONTACTS AND USEFUL LINKS"));
    if bundle.is_fallback {
        blocks.push(Block::paragraph(vec![Run::bold(FALLBACK_CONTACTS_WARNING)]));
    }
    if bundle.is_empty() {
        blocks.push(Block::text(NOT_AVAILABLE));
        return;
    }
    let web = bundle.web_contacts.iter().map(|c| {
        vec![
            Cell::from(Run::link(c.title.clone(), c.url.clone())),
            or_na(&c.description).into(),
        ]
    });
    let email = bundle.email_contacts.iter().map(|c| {
        vec![
            Cell::from(Run::link(c.email.clone(), format!("mailto:{}", c.email))),
            or_na(&c.description).into(),
        ]
    });
    blocks.push(Block::Table(Table {
        header: vec!["Contact".into(), "Description".into()],
        rows: web.chain(email).collect(),
    }));
}

/// Build the report blocks in document order.
pub fn assemble(ctx: &ReportContext<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();
    title_block(ctx.form, &mut blocks);
    history(ctx.generated_at, &mut blocks);
    activity_information(ctx.form, &mut blocks);
    description(ctx.form, &mut blocks);
    definitions(ctx, &mut blocks);
    hazard_details(ctx, &mut blocks);
    supporting_documents(ctx.form, &mut blocks);
    contacts(ctx.contacts, &mut blocks);
    blocks.push(Block::paragraph(vec![Run::italic(format!(
        "Generated on: {} at {}",
        ctx.generated_at.format(DISPLAY_FORMAT),
        ctx.generated_at.format("%H:%M:%S")
    ))]));
    blocks
}
