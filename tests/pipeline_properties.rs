//! End-to-end properties of the standard pipeline on C# fixtures.

use cst_canonizer::{
    parse_csharp, Pipeline, ProgramModel, RewriteConfig, SyntacticModel, UnitReport,
};

fn canonicalize(source: &str) -> UnitReport {
    let mut model = SyntacticModel::new();
    let unit = model.add_source("Sample.cs", source).unwrap();
    Pipeline::standard(RewriteConfig::default())
        .run_unit(unit, &mut model)
        .unwrap()
}

const SERVICE: &str = r#"using System.Linq;
using System;
using System.Threading.Tasks;

namespace Demo
{
    public class Service
    {
        #region Fields
        private int count;
        #endregion



        public Service(string name, int size) { }

        private void helper() { }

        public Task load() { return Task.CompletedTask; }

        public void Configure(string firstArgument, string secondArgument, string thirdArgument, int fourthValue) { }
    }
}
"#;

#[test]
fn pipeline_is_idempotent() {
    let once = canonicalize(SERVICE);
    assert!(once.changed);
    let twice = canonicalize(&once.text);
    assert_eq!(twice.text, once.text);
    assert!(!twice.changed);
}

const TIGHT_MEMBERS: &str = "using System.Threading.Tasks;\n\nclass A\n{\n    public static int Shared;\n    public int total;\n    private async Task run() { await Task.Delay(1); }\n}\n";

const PRIVATE_BEFORE_NESTED: &str = "class A\n{\n    private void B() { }\n    class N { }\n    public void C() { }\n}\n";

#[test]
fn pipeline_is_idempotent_across_layouts() {
    let crlf = SERVICE.replace('\n', "\r\n");
    let fixtures = [
        ("no blank lines between members", TIGHT_MEMBERS),
        ("private methods before nested types", PRIVATE_BEFORE_NESTED),
        (
            "only private methods",
            "class A\n{\n    private void beta() { }\n    private void alpha() { }\n}\n",
        ),
        (
            "initializer inside an argument list",
            "class A\n{\n    public void M()\n    {\n        Foo(new List<int> { 1, 2 }, 3);\n    }\n}\n",
        ),
        ("crlf line breaks", crlf.as_str()),
    ];
    for (label, source) in fixtures {
        let once = canonicalize(source);
        let twice = canonicalize(&once.text);
        assert_eq!(twice.text, once.text, "{label}");
        assert!(!twice.changed, "{label}");
    }

    let text = canonicalize(&crlf).text;
    assert!(!text.replace("\r\n", "").contains('\n'));
}

#[test]
fn region_after_a_tight_member_gets_a_blank_line() {
    let text = canonicalize(TIGHT_MEMBERS).text;
    assert!(text.contains(
        "    public int total;\n\n    #region Private methods\n\n    private async Task RunAsync()"
    ));
    assert!(text.ends_with("\n\n    #endregion\n}\n"));
}

#[test]
fn region_closes_above_nested_types_with_a_blank_line() {
    let report = canonicalize(PRIVATE_BEFORE_NESTED);
    assert_eq!(
        report.text,
        "class A\n{\n    public void C() { }\n\n    #region Private methods\n\n    private void B() { }\n\n    #endregion\n\n    class N { }\n}\n"
    );
}

#[test]
fn fixture_reaches_its_canonical_form() {
    let text = canonicalize(SERVICE).text;
    assert!(text.starts_with("using System;\nusing System.Linq;\nusing System.Threading.Tasks;\n"));
    assert!(!text.contains("#region Fields"));
    assert!(text.contains("private int _count;"));
    assert!(text.contains("public Task LoadAsync()"));
    assert!(text.contains("#region Private methods"));
    assert!(text.contains("private void Helper()"));
    assert!(text.contains("public void Configure(\n            string firstArgument,\n"));
    assert!(!text.contains("\n\n\n"));

    let field = text.find("_count").unwrap();
    let constructor = text.find("public Service(").unwrap();
    let method = text.find("LoadAsync").unwrap();
    assert!(field < constructor && constructor < method);
}

#[test]
fn width_threshold_boundary() {
    let source = |b: usize| {
        format!(
            "public class A\n{{\n    public void M()\n    {{\n        Foo({}, {});\n    }}\n}}\n",
            "a".repeat(46),
            "b".repeat(b)
        )
    };
    let at_limit = canonicalize(&source(47));
    assert!(!at_limit.changed);

    let over = canonicalize(&source(48));
    assert!(over.changed);
    assert!(over.text.contains("        Foo(\n            aaaa"));
    assert!(over.text.contains("\n        );\n"));
}

#[test]
fn blank_line_runs_collapse_to_one() {
    let report = canonicalize("public class A\n{\n    public int X;\n\n\n\n    public int Y;\n}\n");
    assert_eq!(report.text, "public class A\n{\n    public int X;\n\n    public int Y;\n}\n");

    let tight = "public class A\n{\n    public int X;\n    public int Y;\n}\n";
    assert_eq!(canonicalize(tight).text, tight);
}

#[test]
fn unreferenced_private_field_is_prefixed() {
    let report = canonicalize("class Counter\n{\n    private int count;\n}\n");
    assert_eq!(report.text, "class Counter\n{\n    private int _count;\n}\n");
}

#[test]
fn field_written_from_a_setter_keeps_its_name() {
    let source = "class Counter\n{\n    private int count;\n\n    public int Count\n    {\n        set { count = value; }\n    }\n}\n";
    let report = canonicalize(source);
    assert!(report.text.contains("private int count;"));
    assert!(!report.text.contains("_count"));
}

#[test]
fn member_order_ignores_input_order() {
    let members = [
        "    public void MethodB() { }\n",
        "    public int FieldX;\n",
        "    public void MethodA() { }\n",
        "    public Sample(int value) { }\n",
        "    public const int FieldY = 1;\n",
    ];
    let expected = "class Sample\n{\n    public const int FieldY = 1;\n    public int FieldX;\n    public Sample(int value) { }\n    public void MethodA() { }\n    public void MethodB() { }\n}\n";
    for shift in 0..members.len() {
        let mut rotated = members.to_vec();
        rotated.rotate_left(shift);
        let source = format!("class Sample\n{{\n{}}}\n", rotated.concat());
        assert_eq!(canonicalize(&source).text, expected, "rotation {shift}");
    }
}

#[test]
fn backing_fields_move_next_to_their_property() {
    let source = "public class Person\n{\n    private string _name;\n    public Person() { }\n    public string Name { get { return _name; } }\n    public int Age { get; set; }\n}\n";
    let report = canonicalize(source);
    assert_eq!(
        report.text,
        "public class Person\n{\n    public int Age { get; set; }\n    private string _name;\n    public string Name { get { return _name; } }\n    public Person() { }\n}\n"
    );
}

#[test]
fn shared_fields_stay_with_the_fields() {
    let source = "public class Person\n{\n    public string Name { get { return _name; } }\n    public string Title { get { return _name; } }\n    private string _name;\n}\n";
    let report = canonicalize(source);
    assert!(report.text.starts_with("public class Person\n{\n    private string _name;\n"));
}

#[test]
fn canonical_input_round_trips_byte_for_byte() {
    let source = "// Copyright notice\r\nusing System;\r\n\r\npublic class Widget\r\n{\r\n    /// <summary>Size.</summary>\r\n    public int Size { get; set; } // trailing note\r\n\r\n    public void Draw(int x, int y) { }\r\n}\r\n";
    let tree = parse_csharp(source).unwrap();
    assert_eq!(tree.text(), source);
    let report = canonicalize(source);
    assert!(!report.changed);
    assert_eq!(report.text, source);
}

#[test]
fn renames_reach_every_unit_but_not_generated_ones() {
    let mut model = SyntacticModel::new();
    let lib = model
        .add_source("Lib.cs", "public class Lib\n{\n    public void Start() { }\n    public void stop() { }\n}\n")
        .unwrap();
    let user = model
        .add_source("User.cs", "public class User\n{\n    public void Go(Lib lib) { lib.Start(); lib.stop(); }\n}\n")
        .unwrap();
    let generated = model
        .add_source("Client.g.cs", "public class Client\n{\n    public void Call(Lib lib) { lib.stop(); }\n}\n")
        .unwrap();
    assert!(model.is_generated(generated));

    let report = Pipeline::standard(RewriteConfig::default())
        .run_program(&mut model)
        .unwrap();

    assert_eq!(report.units.len(), 2);
    assert!(model.tree(lib).unwrap().text().contains("public void stop()"));
    assert!(model.tree(user).unwrap().text().contains("lib.stop();"));
    assert!(report
        .diagnostics()
        .any(|d| d.message.contains("stop")));
}

#[test]
fn entry_point_units_keep_regions_and_names() {
    let source = "class Program\n{\n    #region Setup\n    static void Main() { }\n    #endregion\n}\n";
    let report = canonicalize(source);
    assert!(report.text.contains("#region Setup"));
    assert!(report.text.contains("static void Main()"));
}
