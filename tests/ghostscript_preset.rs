use std::error::Error;

use sidepipe::presets::{GhostscriptOptions, PaperSize, parse_papersize};
use sidepipe::types::GraphicsFormat;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn default_preset_renders_png_to_side_channel() -> TestResult {
    let gs = GhostscriptOptions::default();

    assert_eq!(
        gs.argv()?,
        vec![
            "gs",
            "-q",
            "-dBATCH",
            "-dNOPROMPT",
            "-sDEVICE=png16m",
            "-sOutputFile={side_channel}",
            "/dev/stdin",
        ]
    );
    assert_eq!(gs.prelude()?, "");
    Ok(())
}

#[test]
fn dpi_and_named_papersize_become_flags() -> TestResult {
    let gs = GhostscriptOptions {
        format: GraphicsFormat::Pdf,
        dpi: Some(300),
        papersize: Some("A4".to_string()),
    };

    let argv = gs.argv()?;
    assert!(argv.contains(&"-sDEVICE=pdfwrite".to_string()));
    assert!(argv.contains(&"-r300x300".to_string()));
    assert!(argv.contains(&"-sPAPERSIZE=a4".to_string()));
    assert_eq!(argv.last().map(String::as_str), Some("/dev/stdin"));
    Ok(())
}

#[test]
fn explicit_dimensions_become_setpagedevice_prelude() -> TestResult {
    let gs = GhostscriptOptions {
        papersize: Some("200x100".to_string()),
        ..GhostscriptOptions::default()
    };

    let req = gs.build_request(b"newpath showpage\n")?;

    assert!(!req.argv().iter().any(|a| a.starts_with("-sPAPERSIZE")));
    assert_eq!(
        req.input(),
        b"<</PageSize [200 100] /ImagingBBox null>> setpagedevice\nnewpath showpage\n"
    );
    assert_eq!(req.side_channel_kind(), "png16m");
    assert!(req.references_side_channel());
    Ok(())
}

#[test]
fn papersize_parsing() -> TestResult {
    assert_eq!(parse_papersize("letter")?, PaperSize::Named("letter".into()));
    assert_eq!(parse_papersize(" A3 ")?, PaperSize::Named("a3".into()));
    assert_eq!(
        parse_papersize("595x842")?,
        PaperSize::Points {
            width: 595,
            height: 842
        }
    );
    assert_eq!(
        parse_papersize("612:792")?,
        PaperSize::Points {
            width: 612,
            height: 792
        }
    );
    assert!(parse_papersize("").is_err());
    assert!(parse_papersize("a4 paper").is_err());
    assert!(parse_papersize("10x").is_err());
    Ok(())
}

#[test]
fn invalid_options_refuse_to_build() -> TestResult {
    let zero_dpi = GhostscriptOptions {
        dpi: Some(0),
        ..GhostscriptOptions::default()
    };
    assert!(zero_dpi.build_request(b"").is_err());

    let bad_paper = GhostscriptOptions {
        papersize: Some("huge!".to_string()),
        ..GhostscriptOptions::default()
    };
    assert!(bad_paper.validate().is_err());
    Ok(())
}

#[test]
fn graphics_format_parses_case_insensitively() -> TestResult {
    assert_eq!("PNG".parse::<GraphicsFormat>()?, GraphicsFormat::Png);
    assert_eq!("pdf".parse::<GraphicsFormat>()?, GraphicsFormat::Pdf);
    assert!("tiff".parse::<GraphicsFormat>().is_err());
    assert_eq!(GraphicsFormat::default(), GraphicsFormat::Png);
    Ok(())
}
