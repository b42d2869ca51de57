use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;
use tfgen::generator::{Generator, GeneratorError, GeneratorOptions};
use walkdir::WalkDir;

/// Workspace with a `configs/` directory for YAML and module sources and an
/// `out/` directory for generated projects.
struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("configs")).unwrap();
        fs::create_dir_all(temp.path().join("out")).unwrap();
        Self { temp }
    }

    fn configs(&self) -> PathBuf {
        self.temp.path().join("configs")
    }

    fn out(&self) -> PathBuf {
        self.temp.path().join("out")
    }

    fn write_config(&self, name: &str, yaml: &str) -> PathBuf {
        let path = self.configs().join(name);
        fs::write(&path, yaml).unwrap();
        path
    }

    fn write_module_file(&self, module: &str, file: &str, content: &str) {
        let path = self.configs().join(module).join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn generator(&self) -> Generator {
        Generator::new(GeneratorOptions {
            output_root: self.out(),
            ..GeneratorOptions::default()
        })
    }
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

fn tfvars(project: &Path) -> Value {
    serde_json::from_str(&read(project.join("terraform.tfvars.json"))).unwrap()
}

/// Relative path -> content for every file under `dir`.
fn snapshot(dir: &Path) -> BTreeMap<String, String> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(dir).unwrap().to_string_lossy().to_string();
            (relative, read(entry.path()))
        })
        .collect()
}

#[test]
fn test_single_module_with_local_source() {
    let ws = Workspace::new();
    ws.write_module_file("mod", "main.tf", "resource \"aws_vpc\" \"this\" {}\n");
    let config = ws.write_config(
        "network.yaml",
        "modules:\n  vpc:\n    source: ./mod\n    cidr: 10.0.0.0/16\n",
    );

    let project = ws.generator().generate(&config).unwrap();

    assert_eq!(project.name, "network");
    assert_eq!(project.root, ws.out().join("network"));
    assert_eq!(project.modules, vec!["vpc"]);
    assert_eq!(project.variables, vec!["vpc_cidr"]);

    let main_tf = read(project.root.join("main.tf"));
    assert!(main_tf.contains("module \"vpc\" {\n  source = \"./modules/vpc\"\n  cidr   = var.vpc_cidr\n}\n"));

    let variables_tf = read(project.root.join("variables.tf"));
    assert!(variables_tf.contains("variable \"vpc_cidr\" {"));
    assert!(!variables_tf.contains("variable \"region\""));

    assert_eq!(tfvars(&project.root), json!({"vpc_cidr": "10.0.0.0/16"}));

    assert_eq!(
        read(project.root.join("modules/vpc/main.tf")),
        "resource \"aws_vpc\" \"this\" {}\n"
    );
}

#[test]
fn test_no_modules_only_region_declared() {
    let ws = Workspace::new();
    let config = ws.write_config("empty.yml", "region: eu-west-2\n");

    let project = ws.generator().generate(&config).unwrap();

    let variables_tf = read(project.root.join("variables.tf"));
    assert_eq!(variables_tf.matches("variable \"").count(), 1);
    assert!(variables_tf.contains("variable \"region\""));
    assert_eq!(tfvars(&project.root), json!({"region": "eu-west-2"}));
    assert!(!project.root.join("modules").exists());
}

#[test]
fn test_no_region_no_modules_has_empty_values() {
    let ws = Workspace::new();
    let config = ws.write_config("bare.yaml", "{}\n");

    let project = ws.generator().generate(&config).unwrap();

    assert_eq!(read(project.root.join("variables.tf")), "");
    assert_eq!(tfvars(&project.root), json!({}));
    assert!(!read(project.root.join("main.tf")).contains("var.region"));
}

#[test]
fn test_cross_module_reference_is_not_lifted() {
    let ws = Workspace::new();
    let config = ws.write_config(
        "stack.yaml",
        r#"
region: us-east-1
modules:
  vpc:
    source: terraform-aws-modules/vpc/aws
    cidr: 10.0.0.0/16
  app:
    source: ./app
    vpc_id: module.vpc.id
    instance_count: 2
"#,
    );

    let project = ws.generator().generate(&config).unwrap();

    let main_tf = read(project.root.join("main.tf"));
    assert!(main_tf.contains("vpc_id         = module.vpc.id"));
    assert!(main_tf.contains("instance_count = var.app_instance_count"));
    assert!(main_tf.contains("source = \"terraform-aws-modules/vpc/aws\""));

    let variables_tf = read(project.root.join("variables.tf"));
    assert!(!variables_tf.contains("app_vpc_id"));

    let values = tfvars(&project.root);
    assert_eq!(
        values,
        json!({"region": "us-east-1", "vpc_cidr": "10.0.0.0/16", "app_instance_count": 2})
    );
    let keys: Vec<&String> = values.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["region", "vpc_cidr", "app_instance_count"]);

    // Registry module is fetched by terraform, the missing local one is stubbed.
    assert!(!project.root.join("modules/vpc").exists());
    assert!(project.root.join("modules/app/outputs.tf").exists());
}

#[test]
fn test_module_arguments_follow_document_order() {
    let ws = Workspace::new();
    ws.write_module_file("db", "main.tf", "");
    let config = ws.write_config(
        "data.yaml",
        "region: us-west-2\nmodules:\n  db:\n    source: ./db\n    zeta: z\n    alpha: 1\n    mid: true\n    engine: postgres\n",
    );

    let project = ws.generator().generate(&config).unwrap();

    let main_tf = read(project.root.join("main.tf"));
    assert!(main_tf.contains(
        "module \"db\" {\n  source = \"./modules/db\"\n  zeta   = var.db_zeta\n  alpha  = var.db_alpha\n  mid    = var.db_mid\n  engine = var.db_engine\n}\n"
    ));

    let values = tfvars(&project.root);
    let keys: Vec<&String> = values.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["region", "db_zeta", "db_alpha", "db_mid", "db_engine"]);

    let variables_tf = read(project.root.join("variables.tf"));
    let positions: Vec<usize> = ["db_zeta", "db_alpha", "db_mid", "db_engine"]
        .iter()
        .map(|name| variables_tf.find(&format!("variable \"{}\"", name)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_rerun_replaces_module_directory_exactly() {
    let ws = Workspace::new();
    ws.write_module_file("mod", "main.tf", "# v1\n");
    ws.write_module_file("mod", "old.tf", "# old\n");
    let config = ws.write_config("net.yaml", "modules:\n  vpc:\n    source: ./mod\n");

    let generator = ws.generator();
    let project = generator.generate(&config).unwrap();
    let module_dir = project.root.join("modules/vpc");
    fs::write(module_dir.join("local-edit.tf"), "# edit\n").unwrap();

    fs::remove_file(ws.configs().join("mod/old.tf")).unwrap();
    ws.write_module_file("mod", "main.tf", "# v2\n");
    ws.write_module_file("mod", "sub/new.tf", "# new\n");

    generator.generate(&config).unwrap();

    assert_eq!(snapshot(&module_dir), snapshot(&ws.configs().join("mod")));
    assert_eq!(read(module_dir.join("main.tf")), "# v2\n");
}

#[test]
fn test_generation_is_idempotent() {
    let ws = Workspace::new();
    ws.write_module_file("mod", "main.tf", "# main\n");
    let config = ws.write_config(
        "idem.yaml",
        "region: us-west-2\nmodules:\n  vpc:\n    source: ./mod\n    cidr: 10.1.0.0/16\n  db:\n    source: ./db\n    size: 20\n",
    );

    let generator = ws.generator();
    let first = generator.generate(&config).unwrap();
    let before = snapshot(&first.root);
    let second = generator.generate(&config).unwrap();

    assert_eq!(first.root, second.root);
    assert_eq!(before, snapshot(&second.root));
}

#[test]
fn test_missing_source_fails_before_writing() {
    let ws = Workspace::new();
    let config = ws.write_config(
        "broken.yaml",
        "modules:\n  ok:\n    source: ./ok\n  vpc:\n    cidr: 10.0.0.0/16\n",
    );

    let err = ws.generator().generate(&config).unwrap_err();

    assert!(matches!(err, GeneratorError::MissingSource { ref module } if module == "vpc"));
    assert!(!ws.out().join("broken").exists());
}

#[test]
fn test_missing_source_lenient_writes_skeleton() {
    let ws = Workspace::new();
    let config = ws.write_config(
        "lenient.yaml",
        "modules:\n  vpc:\n    cidr: 10.0.0.0/16\n    enable_dns: true\n",
    );
    let generator = Generator::new(GeneratorOptions {
        output_root: ws.out(),
        require_source: false,
        ..GeneratorOptions::default()
    });

    let project = generator.generate(&config).unwrap();

    let main_tf = read(project.root.join("main.tf"));
    assert!(main_tf.contains("source     = \"./modules/vpc\""));

    let module_dir = project.root.join("modules/vpc");
    assert!(read(module_dir.join("main.tf")).starts_with("# Placeholder"));
    let module_vars = read(module_dir.join("variables.tf"));
    assert!(module_vars.contains("variable \"cidr\" {\n  type = string\n}"));
    assert!(module_vars.contains("variable \"enable_dns\" {\n  type = bool\n}"));
    assert!(module_dir.join("outputs.tf").exists());
}

#[test]
fn test_gitignore_written_by_default() {
    let ws = Workspace::new();
    let config = ws.write_config("ignored.yaml", "region: us-east-1\n");

    let project = ws.generator().generate(&config).unwrap();

    assert!(read(project.root.join(".gitignore")).contains("*.tfstate"));
    assert!(project.files.contains(&project.root.join(".gitignore")));
}

#[test]
fn test_gitignore_can_be_disabled() {
    let ws = Workspace::new();
    let config = ws.write_config("plain.yaml", "region: us-east-1\n");
    let generator = Generator::new(GeneratorOptions {
        output_root: ws.out(),
        write_gitignore: false,
        ..GeneratorOptions::default()
    });

    let project = generator.generate(&config).unwrap();
    assert!(!project.root.join(".gitignore").exists());
    assert_eq!(project.files.len(), 3);
}

#[test]
fn test_missing_config_file() {
    let ws = Workspace::new();
    let err = ws
        .generator()
        .generate(&ws.configs().join("absent.yaml"))
        .unwrap_err();
    assert!(matches!(err, GeneratorError::ConfigNotFound(_)));
}

#[test]
fn test_backend_and_settings_in_output() {
    let ws = Workspace::new();
    let config = ws.write_config(
        "remote.yaml",
        "region: eu-north-1\nenvironment: prod\nbackend:\n  type: s3\n  bucket: tf-state\n  key: prod.tfstate\nmodules: {}\n",
    );

    let project = ws.generator().generate(&config).unwrap();

    let main_tf = read(project.root.join("main.tf"));
    assert!(main_tf.contains("backend \"s3\" {"));
    assert!(main_tf.contains("bucket = \"tf-state\""));
    assert!(read(project.root.join("variables.tf")).contains("variable \"environment\""));
    assert_eq!(
        tfvars(&project.root),
        json!({"region": "eu-north-1", "environment": "prod"})
    );
}
