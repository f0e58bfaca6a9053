use super::accumulator::{ChunkAccumulator, ChunkSource};
use super::context::{
    CONTENTS_SECTION, GENERAL_SECTION, LineDisposition, SectionContext, TrackerMode,
};
use super::heading::{HeadingLevel, LineClass, NumberedHeading};
use super::identity::{StandardIdentity, UNKNOWN};
use super::layout::{
    BlockKind, LayoutBlock, LayoutDocument, LayoutPage, parse_bbox_layout, parse_layout_json,
};
use super::processor::{DocumentProcessor, LayoutOptions};
use super::record::{Chunk, clean_namespace, document_stem, vector_records};
use crate::catalog::{Catalog, CatalogConfig};

fn builtin_catalog() -> Catalog {
    Catalog::builtin().expect("builtin catalog compiles")
}

fn catalog_without_overrides() -> Catalog {
    let config = CatalogConfig {
        documents: Some(Vec::new()),
        ..CatalogConfig::builtin()
    };
    Catalog::from_config(config).expect("catalog compiles")
}

fn chunk_blocks(source_file: &str, blocks: &[(u32, &str)]) -> Vec<Chunk> {
    let catalog = builtin_catalog();
    let document = LayoutDocument::from_page_texts(source_file, blocks);
    DocumentProcessor::new(&catalog).process(&document)
}

fn numbered(level: HeadingLevel, prefix: &str, title: &str) -> LineClass {
    LineClass::Numbered(NumberedHeading {
        level,
        prefix: prefix.to_string(),
        title: title.to_string(),
    })
}

fn ijarah_fixture() -> Vec<(u32, &'static str)> {
    vec![
        (1, "Financial Accounting Standard No. (32): Ijarah\n"),
        (1, "Contents\n"),
        (1, "Preface ........................ 3\n"),
        (1, "Scope .......................... 5\n"),
        (2, "Preface\n"),
        (2, "The board has approved this standard.\n"),
        (3, "Scope\n"),
        (3, "1. Scope\n"),
        (3, "This standard applies to Ijarah.\n"),
        (4, "2/1 Lessee accounting\n"),
        (4, "2/1/1 Initial recognition\n"),
        (5, "Measured at cost.\n"),
        (6, "Appendix A: Adoption of the standard\n"),
        (6, "Mr. John Smith – Chairman\n"),
        (6, "1. Adoption date\n"),
        (6, "The standard is effective from 2025.\n"),
    ]
}

#[test]
fn classifier_tries_three_part_slash_prefix_first() {
    let catalog = builtin_catalog();
    let classifier = &catalog.classifier;

    assert_eq!(
        classifier.classify("3/4/5 Initial measurement"),
        numbered(HeadingLevel::L3DoubleSlash, "3/4/5", "Initial measurement")
    );
    assert_eq!(
        classifier.classify("3/4 Definitions"),
        numbered(HeadingLevel::L2Slash, "3/4", "Definitions")
    );
    assert_eq!(
        classifier.classify("12. Scope of the Standard"),
        numbered(HeadingLevel::L1Numbered, "12", "Scope of the Standard")
    );
    assert_eq!(
        classifier.classify("IN12 Summary of main changes"),
        numbered(HeadingLevel::InNumbered, "IN12", "Summary of main changes")
    );
}

#[test]
fn classifier_matches_section_markers_before_numbered_patterns() {
    let catalog = builtin_catalog();
    let classifier = &catalog.classifier;

    assert_eq!(
        classifier.classify("  scope  "),
        LineClass::MainSection("Scope".to_string())
    );
    assert_eq!(
        classifier.classify("CONTENTS"),
        LineClass::MainSection(CONTENTS_SECTION.to_string())
    );
    assert_eq!(
        classifier.classify("ACCOUNTING AND FINANCIAL REPORTING BY THE LESSEE"),
        LineClass::MainSection("ACCOUNTING AND FINANCIAL REPORTING BY THE LESSEE".to_string())
    );
    assert_eq!(
        classifier.classify("Appendix (B): Basis for conclusions"),
        LineClass::MainSection("Appendix (B): Basis for conclusions".to_string())
    );
}

#[test]
fn classifier_rejects_table_of_contents_lines() {
    let catalog = builtin_catalog();
    let classifier = &catalog.classifier;

    assert_eq!(
        classifier.classify("3/4 Definitions ........................ 12"),
        LineClass::Plain
    );
    assert_eq!(
        classifier.classify("5. Effective date ........ 20"),
        LineClass::Plain
    );
}

#[test]
fn classifier_rejects_sentences_that_start_with_numbers() {
    let catalog = builtin_catalog();
    let classifier = &catalog.classifier;

    let long_l2 = format!("3/4 {}", vec!["word"; 21].join(" "));
    assert_eq!(classifier.classify(&long_l2), LineClass::Plain);

    let l1_within_limit = format!("7. {}", vec!["word"; 22].join(" "));
    assert!(matches!(
        classifier.classify(&l1_within_limit),
        LineClass::Numbered(NumberedHeading {
            level: HeadingLevel::L1Numbered,
            ..
        })
    ));

    let long_l1 = format!("7. {}", vec!["word"; 26].join(" "));
    assert_eq!(classifier.classify(&long_l1), LineClass::Plain);
}

#[test]
fn classifier_leaves_list_items_and_names_as_body_text() {
    let catalog = builtin_catalog();
    let classifier = &catalog.classifier;

    assert_eq!(classifier.classify("Mr. John Smith – Chairman"), LineClass::Plain);
    assert_eq!(classifier.classify("Dr. Jane Roe - Member"), LineClass::Plain);
    assert_eq!(classifier.classify("a) the lessee shall"), LineClass::Plain);
    assert_eq!(classifier.classify("iv) deferred payment"), LineClass::Plain);
    assert_eq!(classifier.classify("12 months after"), LineClass::Plain);
}

#[test]
fn list_like_lines_never_match_a_numbered_pattern() {
    let catalog = builtin_catalog();
    let classifier = &catalog.classifier;

    for line in [
        "a) 3/4 Measurement basis",
        "iv) 2. Deferred payment",
        "Mr. 12 Smith - Chairman",
    ] {
        assert!(classifier.looks_like_list_item(line), "{line}");
        assert_eq!(classifier.match_numbered_heading(line), None, "{line}");
        assert_eq!(classifier.classify(line), LineClass::Plain, "{line}");
    }
}

#[test]
fn contents_marker_enters_skip_mode_and_drops_toc_lines() {
    let context = SectionContext::default();
    let transition = context.advance(&LineClass::MainSection(CONTENTS_SECTION.to_string()));
    assert!(transition.close_chunk);
    assert_eq!(transition.line, LineDisposition::Drop);
    assert!(transition.next.is_skipping_toc());

    let in_toc = transition.next;
    for class in [
        LineClass::Plain,
        numbered(HeadingLevel::L1Numbered, "1", "Scope"),
        LineClass::MainSection(CONTENTS_SECTION.to_string()),
    ] {
        let transition = in_toc.advance(&class);
        assert!(!transition.close_chunk);
        assert_eq!(transition.line, LineDisposition::Drop);
        assert!(transition.next.is_skipping_toc());
    }

    let exit = in_toc.advance(&LineClass::MainSection("Preface".to_string()));
    assert_eq!(exit.next.mode, TrackerMode::Normal);
    assert_eq!(exit.next.main_section, "Preface");
    assert!(exit.next.heading_path.is_empty());
    assert!(exit.next.awaiting_first_content);
}

#[test]
fn top_rank_heading_is_promoted_from_generic_and_appendix_sections() {
    let heading = numbered(HeadingLevel::L1Numbered, "12", "Scope of the Standard");

    let transition = SectionContext::default().advance(&heading);
    assert!(transition.close_chunk);
    assert_eq!(transition.next.main_section, "Scope of the Standard");
    assert_eq!(
        transition.next.heading_path,
        vec![(HeadingLevel::L1Numbered, "Scope of the Standard".to_string())]
    );
    assert!(transition.next.awaiting_first_content);

    let appendix = SectionContext {
        main_section: "Appendix B: Members".to_string(),
        ..SectionContext::default()
    };
    let transition = appendix.advance(&numbered(HeadingLevel::InNumbered, "IN1", "Overview"));
    assert_eq!(transition.next.main_section, "Overview");
}

#[test]
fn top_rank_heading_repeating_the_section_title_stays_a_sub_heading() {
    let context = SectionContext {
        main_section: "Scope".to_string(),
        awaiting_first_content: true,
        ..SectionContext::default()
    };

    let transition = context.advance(&numbered(HeadingLevel::L1Numbered, "1", "Scope"));
    assert!(!transition.close_chunk);
    assert_eq!(transition.next.main_section, "Scope");
    assert_eq!(
        transition.next.heading_path,
        vec![(HeadingLevel::L1Numbered, "Scope".to_string())]
    );
    assert!(!transition.next.awaiting_first_content);

    let transition = transition
        .next
        .advance(&numbered(HeadingLevel::L1Numbered, "1", "Scope"));
    assert!(transition.close_chunk);
}

#[test]
fn lower_rank_headings_truncate_the_path_to_their_ancestors() {
    let context = SectionContext {
        main_section: "Scope".to_string(),
        heading_path: vec![
            (HeadingLevel::L1Numbered, "Scope".to_string()),
            (HeadingLevel::L2Slash, "Lessee".to_string()),
            (HeadingLevel::L3DoubleSlash, "Initial".to_string()),
        ],
        ..SectionContext::default()
    };

    let l2 = context.advance(&numbered(HeadingLevel::L2Slash, "2/2", "Lessor"));
    assert!(l2.close_chunk);
    assert_eq!(
        l2.next.heading_path,
        vec![
            (HeadingLevel::L1Numbered, "Scope".to_string()),
            (HeadingLevel::L2Slash, "Lessor".to_string()),
        ]
    );

    let l3 = context.advance(&numbered(HeadingLevel::L3DoubleSlash, "2/1/2", "Subsequent"));
    assert_eq!(
        l3.next.heading_path,
        vec![
            (HeadingLevel::L1Numbered, "Scope".to_string()),
            (HeadingLevel::L2Slash, "Lessee".to_string()),
            (HeadingLevel::L3DoubleSlash, "Subsequent".to_string()),
        ]
    );
}

#[test]
fn heading_right_after_a_section_marker_does_not_close_a_chunk() {
    let opened = SectionContext::default()
        .advance(&LineClass::MainSection("Definitions".to_string()))
        .next;
    assert!(opened.awaiting_first_content);

    let transition = opened.advance(&numbered(HeadingLevel::L2Slash, "3/4", "Definitions"));
    assert!(!transition.close_chunk);
}

#[test]
fn accumulator_tracks_start_page_and_skips_blank_content() {
    let source = ChunkSource {
        source_file: "FAS_32.pdf".to_string(),
        identity: StandardIdentity::default(),
    };
    let context = SectionContext::default();
    let mut accumulator = ChunkAccumulator::default();

    accumulator.append("   \n", 2);
    assert_eq!(accumulator.finalize(&source, &context, 2), None);

    accumulator.append("first", 3);
    accumulator.append("second\n", 4);
    let chunk = accumulator
        .finalize(&source, &context, 4)
        .expect("chunk emitted");
    assert_eq!(chunk.content, "first\nsecond");
    assert_eq!((chunk.page_start, chunk.page_end), (3, 4));
    assert_eq!(accumulator.finalize(&source, &context, 4), None);
}

#[test]
fn contents_then_preface_paragraph_yields_one_chunk() {
    let chunks = chunk_blocks(
        "FAS_32.pdf",
        &[
            (1, "Contents\n"),
            (1, "Preface ........................ 2\n"),
            (1, "Definitions .................... 4\n"),
            (2, "Preface\n"),
            (2, "The board has approved this standard for issue.\n"),
        ],
    );

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].main_section, "Preface");
    assert!(chunks[0].heading_path.is_empty());
    assert_eq!(
        chunks[0].content,
        "The board has approved this standard for issue."
    );
    assert_eq!((chunks[0].page_start, chunks[0].page_end), (2, 2));
}

#[test]
fn numbered_heading_under_general_is_promoted_to_main_section() {
    let chunks = chunk_blocks(
        "SS_12_Musharakah.pdf",
        &[
            (1, "Issued by the board.\n"),
            (1, "12. Scope of the Standard\n"),
            (2, "This standard covers partnerships.\n"),
        ],
    );

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].main_section, GENERAL_SECTION);
    assert_eq!(chunks[0].content, "Issued by the board.");
    assert_eq!(chunks[1].main_section, "Scope of the Standard");
    assert_eq!(
        chunks[1].heading_path,
        vec![(HeadingLevel::L1Numbered, "Scope of the Standard".to_string())]
    );
    assert_eq!(
        chunks[1].content,
        "12. Scope of the Standard\nThis standard covers partnerships."
    );
    assert_eq!((chunks[1].page_start, chunks[1].page_end), (1, 2));
}

#[test]
fn sibling_l2_headings_produce_separate_chunks() {
    let chunks = chunk_blocks(
        "FAS_32.pdf",
        &[
            (1, "Definitions\n"),
            (1, "3/4 Definitions\n"),
            (1, "Some body text.\n"),
            (2, "3/5 More Definitions\n"),
            (2, "Other text.\n"),
        ],
    );

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].main_section, "Definitions");
    assert_eq!(
        chunks[0].heading_path,
        vec![(HeadingLevel::L2Slash, "Definitions".to_string())]
    );
    assert_eq!(chunks[0].content, "3/4 Definitions\nSome body text.");
    assert_eq!((chunks[0].page_start, chunks[0].page_end), (1, 1));
    assert_eq!(
        chunks[1].heading_path,
        vec![(HeadingLevel::L2Slash, "More Definitions".to_string())]
    );
    assert_eq!(chunks[1].content, "3/5 More Definitions\nOther text.");
}

#[test]
fn honorific_lines_fold_into_the_surrounding_chunk() {
    let chunks = chunk_blocks(
        "FAS_32.pdf",
        &[
            (9, "Appendix B: Members of the board\n"),
            (9, "Mr. John Smith – Chairman\n"),
            (9, "Ms. Jane Roe – Deputy Chairman\n"),
        ],
    );

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].main_section, "Appendix B: Members of the board");
    assert_eq!(
        chunks[0].content,
        "Mr. John Smith – Chairman\nMs. Jane Roe – Deputy Chairman"
    );
}

#[test]
fn identity_falls_back_to_first_page_title_line() {
    let catalog = catalog_without_overrides();
    let document = LayoutDocument::from_page_texts(
        "FAS_32.pdf",
        &[
            (1, "AAOIFI\n"),
            (1, "Financial Accounting Standard No. (32): Ijarah\n"),
            (2, "Body text.\n"),
        ],
    );

    let processed = DocumentProcessor::new(&catalog).process_detailed(&document);
    assert_eq!(
        processed.identity,
        StandardIdentity {
            standard_no: "32".to_string(),
            standard_name: "Ijarah".to_string(),
        }
    );
    assert!(processed.chunks.iter().all(|chunk| {
        chunk.standard_no == "32" && chunk.standard_name == "Ijarah"
    }));
}

#[test]
fn identity_keeps_filename_number_on_mismatch() {
    let catalog = catalog_without_overrides();
    let document = LayoutDocument::from_page_texts(
        "FAS_7.pdf",
        &[(1, "Financial Accounting Standard No. (9): Salam and Parallel Salam\n")],
    );

    let identity = catalog.identity.resolve("FAS_7.pdf", &document);
    assert_eq!(identity.standard_no, "7");
    assert_eq!(identity.standard_name, "Salam and Parallel Salam");
}

#[test]
fn identity_matches_known_title_on_following_line() {
    let catalog = catalog_without_overrides();
    let document = LayoutDocument::from_page_texts(
        "board_release.pdf",
        &[(1, "Accounting and Auditing Organization\nMusharaka Financing\n")],
    );

    let identity = catalog.identity.resolve("board_release.pdf", &document);
    assert_eq!(identity.standard_no, UNKNOWN);
    assert_eq!(identity.standard_name, "Musharaka Financing");
}

#[test]
fn identity_uses_override_table_before_document_content() {
    let catalog = builtin_catalog();
    let document = LayoutDocument::from_page_texts(
        "SS_8_Murabahah.pdf",
        &[(1, "Ijarah\n")],
    );

    let identity = catalog.identity.resolve("SS_8_Murabahah.pdf", &document);
    assert_eq!(identity.standard_no, "8");
    assert_eq!(identity.standard_name, "SS_8_Murabahah");
}

#[test]
fn unresolved_identity_is_carried_into_chunk_metadata() {
    let chunks = chunk_blocks("notes.pdf", &[(1, "Plain body text only.\n")]);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].standard_no, UNKNOWN);
    assert_eq!(chunks[0].standard_name, UNKNOWN);
}

#[test]
fn full_document_chunks_follow_structure() {
    let chunks = chunk_blocks("FAS_32.pdf", &ijarah_fixture());

    let summary = chunks
        .iter()
        .map(|chunk| {
            (
                chunk.main_section.as_str(),
                chunk.heading_path.len(),
                chunk.page_start,
                chunk.page_end,
            )
        })
        .collect::<Vec<(&str, usize, u32, u32)>>();

    assert_eq!(
        summary,
        vec![
            (GENERAL_SECTION, 0, 1, 1),
            ("Preface", 0, 2, 2),
            ("Scope", 1, 3, 3),
            ("Scope", 2, 4, 4),
            ("Scope", 3, 4, 5),
            ("Appendix A: Adoption of the standard", 0, 6, 6),
            ("Adoption date", 1, 6, 6),
        ]
    );
}

#[test]
fn chunk_contents_reconstruct_body_text_without_toc_and_markers() {
    let fixture = ijarah_fixture();
    let chunks = chunk_blocks("FAS_32.pdf", &fixture);

    let excluded = [
        "Contents",
        "Preface ........................ 3",
        "Scope .......................... 5",
        "Preface",
        "Scope",
        "Appendix A: Adoption of the standard",
    ];
    let expected = fixture
        .iter()
        .map(|(_, text)| text.trim())
        .filter(|text| !excluded.contains(text))
        .collect::<Vec<&str>>()
        .join("\n");

    let reconstructed = chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<&str>>()
        .join("\n");

    assert_eq!(reconstructed, expected);
}

#[test]
fn chunk_invariants_hold_for_every_chunk() {
    let chunks = chunk_blocks("FAS_32.pdf", &ijarah_fixture());
    assert!(!chunks.is_empty());

    for chunk in &chunks {
        assert!(chunk.page_start <= chunk.page_end);
        assert!(!chunk.content.trim().is_empty());
        assert!(
            chunk
                .heading_path
                .windows(2)
                .all(|pair| pair[0].0.rank() <= pair[1].0.rank())
        );
    }
}

#[test]
fn processing_is_idempotent() {
    let catalog = builtin_catalog();
    let document = LayoutDocument::from_page_texts("FAS_32.pdf", &ijarah_fixture());
    let processor = DocumentProcessor::new(&catalog);

    let first = serde_json::to_vec(&processor.process(&document)).expect("serialize");
    let second = serde_json::to_vec(&processor.process(&document)).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn document_ending_inside_toc_emits_only_prior_content() {
    let chunks = chunk_blocks(
        "FAS_32.pdf",
        &[
            (1, "Cover note.\n"),
            (2, "Contents\n"),
            (2, "Scope ........ 4\n"),
        ],
    );

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "Cover note.");
    assert_eq!((chunks[0].page_start, chunks[0].page_end), (1, 1));
}

#[test]
fn multi_line_appendix_block_keeps_text_after_the_marker() {
    let chunks = chunk_blocks(
        "FAS_32.pdf",
        &[(7, "Appendix C\nThe following members dissented.\n")],
    );

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].main_section, "Appendix C");
    assert_eq!(chunks[0].content, "The following members dissented.");
}

#[test]
fn heading_after_a_marker_with_body_text_closes_the_marker_chunk() {
    let chunks = chunk_blocks(
        "FAS_32.pdf",
        &[
            (7, "Appendix A: Basis for conclusions\nThe board considered comments.\n"),
            (7, "1/1 Lessee measurement\n"),
            (8, "Measured at cost.\n"),
        ],
    );

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].main_section, "Appendix A: Basis for conclusions");
    assert!(chunks[0].heading_path.is_empty());
    assert_eq!(chunks[0].content, "The board considered comments.");
    assert_eq!((chunks[0].page_start, chunks[0].page_end), (7, 7));

    assert_eq!(chunks[1].main_section, "Appendix A: Basis for conclusions");
    assert_eq!(
        chunks[1].heading_path,
        vec![(HeadingLevel::L2Slash, "Lessee measurement".to_string())]
    );
    assert_eq!(chunks[1].content, "1/1 Lessee measurement\nMeasured at cost.");
    assert_eq!((chunks[1].page_start, chunks[1].page_end), (7, 8));
}

#[test]
fn non_text_blocks_are_skipped() {
    let catalog = builtin_catalog();
    let document = LayoutDocument {
        source_file: "FAS_32.pdf".to_string(),
        pages: vec![LayoutPage {
            page_number: 1,
            blocks: vec![
                LayoutBlock {
                    page_number: 1,
                    kind: BlockKind::Image,
                    text: "<image: DeviceRGB>".to_string(),
                },
                LayoutBlock::text(1, "Visible text.\n"),
            ],
        }],
    };

    let chunks = DocumentProcessor::new(&catalog).process(&document);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "Visible text.");
}

#[test]
fn unreadable_document_yields_no_chunks() {
    let catalog = builtin_catalog();
    let chunks = DocumentProcessor::new(&catalog).process_path(
        std::path::Path::new("/nonexistent/FAS_99.json"),
        LayoutOptions::default(),
    );
    assert!(chunks.is_empty());
}

#[test]
fn parse_bbox_layout_groups_words_into_blocks_per_page() {
    let xhtml = r#"<doc>
  <page width="595.0" height="842.0">
    <flow>
      <block xMin="1" yMin="1" xMax="2" yMax="2">
        <line xMin="1" yMin="1" xMax="2" yMax="2">
          <word xMin="1" yMin="1" xMax="2" yMax="2">Contents</word>
        </line>
      </block>
      <block xMin="1" yMin="3" xMax="2" yMax="4">
        <line xMin="1" yMin="3" xMax="2" yMax="4">
          <word xMin="1" yMin="3" xMax="2" yMax="4">Sale</word>
          <word xMin="1" yMin="3" xMax="2" yMax="4">&amp;</word>
          <word xMin="1" yMin="3" xMax="2" yMax="4">Ijarah-back</word>
        </line>
        <line xMin="1" yMin="5" xMax="2" yMax="6">
          <word xMin="1" yMin="5" xMax="2" yMax="6">transactions</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="595.0" height="842.0">
    <flow>
      <block xMin="1" yMin="1" xMax="2" yMax="2">
        <line xMin="1" yMin="1" xMax="2" yMax="2">
          <word xMin="1" yMin="1" xMax="2" yMax="2">Preface</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="595.0" height="842.0">
  </page>
</doc>"#;

    let pages = parse_bbox_layout(xhtml).expect("layout parses");
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].blocks.len(), 2);
    assert_eq!(pages[0].blocks[0].text, "Contents\n");
    assert_eq!(pages[0].blocks[1].text, "Sale & Ijarah-back\ntransactions\n");
    assert_eq!(pages[1].page_number, 2);
    assert_eq!(pages[1].blocks[0].page_number, 2);
}

#[test]
fn parse_bbox_layout_resolves_character_and_named_references() {
    let xhtml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<meta name="Producer" content="pdfTeX &amp; friends"/>
<title>FAS 32</title>
</head>
<body>
<doc>
  <page width="595.0" height="842.0">
    <flow>
      <block xMin="1" yMin="1" xMax="2" yMax="2">
        <line xMin="1" yMin="1" xMax="2" yMax="2">
          <word xMin="1" yMin="1" xMax="2" yMax="2">Lessee&#8217;s</word>
          <word xMin="1" yMin="1" xMax="2" yMax="2">caf&#xE9;</word>
          <word xMin="1" yMin="1" xMax="2" yMax="2">&amp;</word>
          <word xMin="1" yMin="1" xMax="2" yMax="2">&lt;lessor&gt;</word>
        </line>
      </block>
    </flow>
  </page>
</doc>
</body>
</html>"#;

    let pages = parse_bbox_layout(xhtml).expect("layout parses");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].blocks.len(), 1);
    assert_eq!(pages[0].blocks[0].text, "Lessee\u{2019}s caf\u{e9} & <lessor>\n");
}

#[test]
fn parse_bbox_layout_rejects_malformed_markup() {
    let xhtml = "<doc><page><block><line><word>Scope</line></block></page></doc>";
    assert!(parse_bbox_layout(xhtml).is_err());
}

#[test]
fn parse_layout_json_defaults_page_numbers_and_block_kinds() {
    let raw = br#"{
        "pages": [
            { "blocks": [ { "text": "Scope\n" }, { "kind": "image", "text": "" } ] },
            { "page_number": 5, "blocks": [ { "kind": "table", "text": "cell" } ] }
        ]
    }"#;

    let document = parse_layout_json(raw, "FAS_4_Musharaka.json").expect("layout parses");
    assert_eq!(document.source_file, "FAS_4_Musharaka.json");
    assert_eq!(document.pages[0].page_number, 1);
    assert_eq!(document.pages[0].blocks[0].kind, BlockKind::Text);
    assert_eq!(document.pages[0].blocks[1].kind, BlockKind::Image);
    assert_eq!(document.pages[1].blocks[0].page_number, 5);
    assert_eq!(document.pages[1].blocks[0].kind, BlockKind::Other);
    assert_eq!(document.text_blocks().count(), 1);
}

#[test]
fn vector_record_flattens_metadata_to_strings() {
    let chunk = Chunk {
        source_file: "FAS_32.pdf".to_string(),
        standard_no: "32".to_string(),
        standard_name: "Ijarah".to_string(),
        page_start: 4,
        page_end: 5,
        main_section: "Scope".to_string(),
        heading_path: vec![
            (HeadingLevel::L1Numbered, "Scope".to_string()),
            (HeadingLevel::L2Slash, "Lessee".to_string()),
        ],
        content: "x".repeat(600),
    };

    let record = chunk.to_vector_record("fas_32:0001".to_string(), "fas_full");
    assert_eq!(record.metadata.page_start, "4");
    assert_eq!(record.metadata.page_end, "5");
    assert_eq!(record.metadata.text_snippet.chars().count(), 500);
    assert_eq!(
        record.metadata.heading_path,
        vec!["L1_NumDot: Scope".to_string(), "L2_Slash: Lessee".to_string()]
    );

    let json = serde_json::to_value(&chunk).expect("chunk serializes");
    assert_eq!(json["heading_path"][1][0], "L2_Slash");
    assert_eq!(json["heading_path"][1][1], "Lessee");
}

#[test]
fn clean_namespace_keeps_lowercase_slug_characters() {
    assert_eq!(clean_namespace("FAS 32  Ijarah!"), "fas_32_ijarah");
    assert_eq!(clean_namespace("SS_12-Musharakah"), "ss_12-musharakah");
}

#[test]
fn vector_records_use_stable_sequence_ids() {
    let chunks = chunk_blocks(
        "FAS_32.pdf",
        &[
            (1, "Definitions\n"),
            (1, "3/4 Definitions\n"),
            (1, "Some body text.\n"),
            (2, "3/5 More Definitions\n"),
        ],
    );

    let doc_id = document_stem("FAS_32.pdf");
    assert_eq!(doc_id, "FAS_32");

    let records = vector_records(doc_id, &chunks, "FAS Full");
    let ids = records
        .iter()
        .map(|record| record.id.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(ids, vec!["FAS_32:0000", "FAS_32:0001"]);
    assert!(records.iter().all(|record| record.namespace == "fas_full"));
    assert_eq!(records[1].metadata.main_section, "Definitions");
}
