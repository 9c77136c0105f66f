use css_sprite_core::prelude::*;
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_png(root: &Path, rel: &str, w: u32, h: u32, color: [u8; 4]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    RgbaImage::from_pixel(w, h, Rgba(color)).save(&path).expect("save png");
}

fn write_css(root: &Path, text: &str) {
    let path = root.join("public/stylesheets/main.css");
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, text).expect("write css");
}

fn app() -> (TempDir, SpriteConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = SpriteConfig::builder().app_root(dir.path()).build();
    (dir, cfg)
}

const MAIN_CSS: &str = "\
#header { background: #fff url('/public/images/banner.png') no-repeat; }\n\
.icon { background-image: url(/public/images/icon.png); }\n\
.close { background: url(\"/public/images/close.png\") no-repeat right; }\n\
.again { background: url(/public/images/icon.png); }\n\
.photo { background: url(/public/images/photo.jpg); }\n\
.missing { background: url(/public/images/missing.png); }\n";

fn seed_images(root: &Path) {
    write_png(root, "public/images/banner.png", 100, 80, [255, 0, 0, 255]);
    write_png(root, "public/images/icon.png", 40, 40, [0, 255, 0, 128]);
    write_png(root, "public/images/close.png", 40, 20, [0, 0, 255, 255]);
}

#[test]
fn run_writes_atlas_and_stylesheet() {
    let (dir, cfg) = app();
    seed_images(dir.path());
    write_css(dir.path(), MAIN_CSS);

    let report = run(&cfg).expect("run");
    assert_eq!(report.placements, 3);
    // the row is closed by close.png, so the legacy height stops at its bottom edge
    assert_eq!(report.atlas_size, (100, 100));
    assert!(report.image.is_written());
    assert!(report.stylesheet.is_written());
    assert!(report.blit_error.is_none());

    let png = image::open(cfg.image_destination()).expect("atlas").to_rgba8();
    assert_eq!(png.dimensions(), (100, 100));
    assert_eq!(png.get_pixel(99, 79), &Rgba([255, 0, 0, 255]));
    assert_eq!(png.get_pixel(0, 80), &Rgba([0, 255, 0, 128]));
    assert_eq!(png.get_pixel(40, 80), &Rgba([0, 0, 255, 255]));

    let css = fs::read_to_string(cfg.css_destination()).expect("css");
    assert_eq!(
        css,
        "#header , .icon , .close  { background: white url(/public/images/play-sprite.png) no-repeat left top;}\n\
         #header { background-position: 0px 0px; }\n\
         .icon { background-position: 0px -80px; }\n\
         .close { background-position: -40px -80px; }\n\n"
    );
}

#[test]
fn right_aligned_image_at_left_edge() {
    let (dir, cfg) = app();
    write_png(dir.path(), "public/images/arrow.png", 16, 16, [0, 0, 0, 255]);
    write_css(
        dir.path(),
        ".next { background: transparent url(/public/images/arrow.png) no-repeat right center; }",
    );
    run(&cfg).expect("run");
    let css = fs::read_to_string(cfg.css_destination()).expect("css");
    assert!(css.contains(".next { background-position: right 0px; }"));
}

#[test]
fn second_run_is_byte_identical() {
    let (dir, cfg) = app();
    seed_images(dir.path());
    write_css(dir.path(), MAIN_CSS);

    run(&cfg).expect("first run");
    let png1 = fs::read(cfg.image_destination()).expect("png");
    let css1 = fs::read(cfg.css_destination()).expect("css");
    run(&cfg).expect("second run");
    assert_eq!(fs::read(cfg.image_destination()).expect("png"), png1);
    assert_eq!(fs::read(cfg.css_destination()).expect("css"), css1);
}

#[test]
fn previous_artifacts_are_replaced() {
    let (dir, cfg) = app();
    seed_images(dir.path());
    write_css(dir.path(), MAIN_CSS);
    fs::create_dir_all(cfg.image_destination().parent().expect("parent")).expect("mkdir");
    fs::write(cfg.image_destination(), b"stale").expect("stale png");
    fs::write(cfg.css_destination(), "stale { }").expect("stale css");

    run(&cfg).expect("run");
    let css = fs::read_to_string(cfg.css_destination()).expect("css");
    assert!(!css.contains("stale"));
    assert!(image::open(cfg.image_destination()).is_ok());
}

#[test]
fn empty_stylesheet_produces_empty_css_and_no_image() {
    let (dir, cfg) = app();
    write_css(dir.path(), "body { color: black; }");
    fs::create_dir_all(cfg.image_destination().parent().expect("parent")).expect("mkdir");
    fs::write(cfg.image_destination(), b"stale").expect("stale png");

    let report = run(&cfg).expect("run");
    assert_eq!(report.placements, 0);
    assert_eq!(report.atlas_size, (0, 0));
    assert!(matches!(report.image, ArtifactOutcome::Skipped(_)));
    assert!(!report.atlas_missing());
    assert!(!cfg.image_destination().exists());
    assert!(report.stylesheet.is_written());
    assert_eq!(fs::read_to_string(cfg.css_destination()).expect("css"), "");
}

#[test]
fn parse_failure_aborts_before_writing() {
    let (dir, cfg) = app();
    write_css(dir.path(), ".broken { background: url(/a.png)");
    let err = run(&cfg).expect_err("must fail");
    assert!(matches!(err, SpriteError::Parse { line: 1, .. }));
    assert!(!cfg.css_destination().exists());
    assert!(!cfg.image_destination().exists());
}

#[test]
fn missing_stylesheet_is_an_io_error() {
    let (_dir, cfg) = app();
    assert!(matches!(run(&cfg), Err(SpriteError::Io(_))));
}

#[test]
fn undecodable_image_is_skipped() {
    let (dir, cfg) = app();
    write_png(dir.path(), "public/images/ok.png", 10, 10, [1, 2, 3, 255]);
    fs::write(dir.path().join("public/images/bad.png"), b"garbage").expect("bad png");
    write_css(
        dir.path(),
        ".bad { background: url(/public/images/bad.png) }\n.ok { background: url(/public/images/ok.png) }",
    );
    let report = run(&cfg).expect("run");
    assert_eq!(report.placements, 1);
    let css = fs::read_to_string(cfg.css_destination()).expect("css");
    assert!(css.contains(".ok { background-position: 0px 0px; }"));
    assert!(!css.contains(".bad"));
}

#[test]
fn single_image_legacy_layout_has_no_atlas_image() {
    let (dir, cfg) = app();
    write_png(dir.path(), "public/images/only.png", 10, 10, [1, 2, 3, 255]);
    write_css(dir.path(), ".only { background: url(/public/images/only.png) }");
    let report = run(&cfg).expect("run");
    assert_eq!(report.atlas_size, (10, 0));
    assert!(matches!(report.image, ArtifactOutcome::Skipped(_)));
    assert!(report.atlas_missing());
    assert!(fs::read_to_string(cfg.css_destination()).expect("css").contains(".only "));

    let cfg = SpriteConfig {
        row_height: RowHeightPolicy::Tallest,
        ..cfg
    };
    let report = run(&cfg).expect("run");
    assert_eq!(report.atlas_size, (10, 10));
    assert!(report.image.is_written());
    assert!(!report.atlas_missing());
}

#[test]
fn equal_width_icons_leave_legacy_atlas_without_area() {
    let (dir, cfg) = app();
    for name in ["a", "b", "c"] {
        write_png(dir.path(), &format!("public/images/{name}.png"), 16, 16, [9, 9, 9, 255]);
    }
    write_css(
        dir.path(),
        ".a { background: url(/public/images/a.png) }\n\
         .b { background: url(/public/images/b.png) }\n\
         .c { background: url(/public/images/c.png) }",
    );
    let report = run(&cfg).expect("run");
    assert_eq!(report.placements, 3);
    assert_eq!(report.atlas_size, (16, 0));
    assert!(report.atlas_missing());
    assert!(report.stylesheet.is_written());
}

#[test]
fn unwritable_destination_is_reported_not_fatal() {
    let (dir, cfg) = app();
    seed_images(dir.path());
    write_css(dir.path(), MAIN_CSS);
    // a file where the css output directory should be
    let cfg = SpriteConfig {
        css_dir: "blocked".into(),
        ..cfg
    };
    fs::write(dir.path().join("blocked"), b"x").expect("blocker");
    let report = run(&cfg).expect("run");
    assert!(report.image.is_written());
    assert!(matches!(
        report.stylesheet,
        ArtifactOutcome::Failed(SpriteError::Write { .. })
    ));
}

struct CountingLoader(std::cell::Cell<usize>);

impl AssetLoader for CountingLoader {
    fn load(&self, path: &Path) -> css_sprite_core::Result<ImageAsset> {
        self.0.set(self.0.get() + 1);
        Ok(ImageAsset::new(path, RgbaImage::new(8, 8)))
    }
}

#[test]
fn repeated_reference_is_loaded_once_and_owned_by_first_block() {
    let sheet = parse_stylesheet(
        ".one { background: url(/img/a.png) }\n\
         .two { background: url(/img/../img/a.png) }",
    )
    .expect("parse");
    let loader = CountingLoader(std::cell::Cell::new(0));
    let out = build_sprite(&sheet, &loader, &SpriteConfig::builder().app_root("/app").build());
    assert_eq!(loader.0.get(), 1);
    assert_eq!(out.atlas.placements.len(), 1);
    assert_eq!(out.atlas.placements[0].origin.selector.reconstruct(), ".one ");
}

#[test]
fn layout_json_describes_placements() {
    let sheet = parse_stylesheet(".a { background: url(/a.png) } .b { background: url(/b.png) }")
        .expect("parse");
    let loader = CountingLoader(std::cell::Cell::new(0));
    let cfg = SpriteConfig::default();
    let out = build_sprite(&sheet, &loader, &cfg);
    let json = css_sprite_core::to_json_layout(&out.atlas, &cfg.atlas_url());
    assert_eq!(json["width"], 8);
    assert_eq!(json["placements"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(json["placements"][1]["rule"], ".b { background-position: 0px -8px; }");
}
