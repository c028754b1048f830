use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const COPPER: &str = "\
%FSLAX34Y34*%
%MOMM*%
%ADD10R,1.000X0.600*%
D10*
X100000Y100000D03*
X200000Y100000D03*
X150000Y300000D03*
M02*
";

const OUTLINE: &str = "\
%FSLAX34Y34*%
%MOMM*%
%ADD11C,0.100*%
D11*
X0Y0D02*
X500000Y0D01*
X500000Y400000D01*
X0Y400000D01*
X0Y0D01*
M02*
";

fn pastekit(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_pastekit"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run pastekit")
}

fn board(dir: &Path) -> (String, String, String) {
    let copper = dir.join("board-F_Cu.gbr");
    let outline = dir.join("board-Edge_Cuts.gbr");
    let config = dir.join("config.toml");
    std::fs::write(&copper, COPPER).unwrap();
    std::fs::write(&outline, OUTLINE).unwrap();

    let out = pastekit(&["init-config", config.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(config.exists());

    (
        copper.display().to_string(),
        outline.display().to_string(),
        config.display().to_string(),
    )
}

#[test]
fn test_plan_json_in_machine_frame() {
    let dir = TempDir::new().unwrap();
    let (copper, outline, config) = board(dir.path());
    let plan_path = dir.path().join("plan.json");

    let out = pastekit(&[
        "plan",
        "--structural",
        &copper,
        "--outline",
        &outline,
        "--config",
        &config,
        "--align",
        "0,0=100,100",
        "--align",
        "10,0=110,100",
        "--json",
        "-o",
        plan_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let plan: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&plan_path).unwrap()).unwrap();
    assert_eq!(plan["origin"]["x"], 0.0);
    assert_eq!(plan["origin"]["y"], 40.0);
    assert_eq!(plan["summary"]["pad_count"], 3);
    assert_eq!(plan["alignment"]["transform"]["kind"], "similarity");

    // Nearest to the (0, 40) origin is the pad at (15, 30), shifted by (100, 100).
    let first = &plan["sequence"][0]["pad"];
    assert_eq!(first["id"], "S3");
    assert!((first["x"].as_f64().unwrap() - 115.0).abs() < 1e-6);
    assert!((first["y"].as_f64().unwrap() - 130.0).abs() < 1e-6);
}

#[test]
fn test_plan_gcode_to_stdout() {
    let dir = TempDir::new().unwrap();
    let (copper, outline, config) = board(dir.path());

    let out = pastekit(&[
        "plan",
        "--structural",
        &copper,
        "--outline",
        &outline,
        "--config",
        &config,
    ]);
    assert!(out.status.success());
    let gcode = String::from_utf8(out.stdout).unwrap();
    assert!(gcode.starts_with("; PasteKit dispensing program"));
    assert!(gcode.contains("G21"));
    assert_eq!(gcode.matches("; Pad S").count(), 3);
    assert!(gcode.trim_end().ends_with("M30 ; End program"));
}

#[test]
fn test_plan_fails_on_missing_layer_and_degenerate_fit() {
    let dir = TempDir::new().unwrap();
    let (copper, _, config) = board(dir.path());
    let missing = dir.path().join("absent.gbr");

    let out = pastekit(&["plan", "--structural", missing.to_str().unwrap(), "--config", &config]);
    assert!(!out.status.success());

    let out = pastekit(&[
        "plan",
        "--structural",
        &copper,
        "--config",
        &config,
        "--align",
        "5,5=10,10",
        "--align",
        "5,5=20,20",
    ]);
    assert!(!out.status.success());
}
