use permalinks::{Call, Error, File, Permalinks, register_text_helpers};
use serde_json::{Map, Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

fn locals(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("locals must be an object"),
    }
}

fn format(structure: &str, file: &File) -> String {
    Permalinks::new()
        .format(structure, file, &Map::new())
        .unwrap()
}

fn render(p: &Permalinks, structure: &str, file: &File) -> String {
    p.format(structure, file, &Map::new()).unwrap()
}

fn identity(call: &Call<'_>) -> anyhow::Result<Value> {
    Ok(call.arg(0).cloned().unwrap_or(Value::Null))
}

fn shout(call: &Call<'_>) -> anyhow::Result<Value> {
    let text = call.str_arg(0).unwrap_or_default();
    Ok(json!(text.to_uppercase()))
}

mod params {
    use super::*;

    #[test]
    fn locals_override_path_fields() {
        let p = Permalinks::new();
        let name = locals(json!({"name": "abc"}));
        let out = p.format(":name", &File::new("foo.hbs"), &name).unwrap();
        assert_eq!(out, "abc");

        let out = p.format(":name/index.html", &"foo/bar/baz.hbs".into(), &name);
        assert_eq!(out.unwrap(), "abc/index.html");
    }

    #[test]
    fn path_fields() {
        let file = File::new("foo/bar/baz.hbs");
        assert_eq!(format(":stem", &File::new("foo.hbs")), "foo");
        assert_eq!(format(":stem/index.html", &file), "baz/index.html");
        assert_eq!(format(":dirname/index.html", &file), "foo/bar/index.html");
    }

    #[test]
    fn handlebars_syntax_passes_through() {
        let file = File::new("foo/bar/baz.hbs");
        assert_eq!(format("{{stem}}/index.html", &file), "baz/index.html");
        assert_eq!(
            format("{{dirname}}/index.html", &file),
            "foo/bar/index.html"
        );
    }
}

mod file_properties {
    use super::*;

    #[test]
    fn props_without_a_path() {
        let html = File::from_props([("basename", "foo"), ("ext", ".html")]);
        assert_eq!(format(":basename:ext", &html), "foo.html");

        let bare = File::from_props([("basename", "foo"), ("ext", "")]);
        assert_eq!(format(":basename/index:ext", &bare), "foo/index");

        let section = File::from_props([("section", "foo")]);
        assert_eq!(format(":section", &section), "foo");
        assert_eq!(format(":section/abc", &section), "foo/abc");
    }

    #[test]
    fn locals_override_the_extension() {
        let p = Permalinks::new();
        let html = locals(json!({"ext": ".html"}));
        let file = File::new("a/b/c.md");
        assert_eq!(
            p.format(":stem/:dirname/index:ext", &file, &html).unwrap(),
            "c/a/b/index.html"
        );
        assert_eq!(
            p.format(":dirname/:stem/index:ext", &file, &html).unwrap(),
            "a/b/c/index.html"
        );
    }

    #[test]
    fn file_structure_wins() {
        let p = Permalinks::new();
        let html = locals(json!({"ext": ".html"}));

        let as_string = File::new("a/b/c.md").with_data("permalink", ":basename");
        let out = p.format(":stem/:dirname/index:ext", &as_string, &html);
        assert_eq!(out.unwrap(), "c.md");

        let table = json!({"structure": ":basename"});
        let as_table = File::new("a/b/c.md").with_data("permalink", table);
        let out = p.format(":stem/:dirname/index:ext", &as_table, &html);
        assert_eq!(out.unwrap(), "c.md");
        assert_eq!(p.format_file(&as_table, &Map::new()).unwrap(), "c.md");
    }

    #[test]
    fn arbitrary_segments() {
        let file = File::from_props([
            ("basename", "favicon"),
            ("section", "images"),
            ("ext", ".png"),
            ("num", "0000"),
        ]);
        let out = format(":section/:basename-:num:ext", &file);
        assert_eq!(out, "images/favicon-0000.png");
    }

    #[test]
    fn date_as_plain_data() {
        let file = File::from_props([
            ("basename", "foo"),
            ("ext", ".md"),
            ("date", "2013-02-13"),
        ]);
        assert_eq!(format(":date/index:ext", &file), "2013-02-13/index.md");
    }

    #[test]
    fn front_matter_is_data() {
        let file = File::new("posts/x.md").with_data("title", "Hello World");
        let out = format(":slugify(title)/index.html", &file);
        assert_eq!(out, "hello-world/index.html");
    }
}

mod helpers {
    use super::*;

    #[test]
    fn helper_reads_the_file() {
        let mut p = Permalinks::new();
        p.helper("zzz", |call: &Call<'_>| {
            let stem = call.file().info().map(|info| info.name).unwrap_or_default();
            Ok(json!(stem))
        });
        let baz = File::new("foo/bar/baz.hbs");
        assert_eq!(render(&p, ":zzz/index.html", &baz), "baz/index.html");
    }

    #[test]
    fn context_functions_run_on_every_render() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut p = Permalinks::new();
        let counter = Arc::clone(&count);
        p.context(move |_, data| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            data.insert("num".to_owned(), json!(n));
        });

        let file = File::new("foo/bar/baz.hbs");
        for expected in ["baz-1", "baz-2", "baz-3"] {
            assert_eq!(render(&p, ":stem-:num", &file), expected);
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn helper_arguments() {
        let mut p = Permalinks::new();
        p.helper("zzz", identity);
        let file = File::new("foo/bar/baz.hbs");
        let aaa = locals(json!({"aaa": "bbb"}));
        let out = p.format(":zzz(aaa)/index.html", &file, &aaa).unwrap();
        assert_eq!(out, "bbb/index.html");
    }

    #[test]
    fn subexpressions() {
        let mut p = Permalinks::new();
        p.helper("zzz", identity)
            .helper("upper", shout)
            .helper("dashify", |call: &Call<'_>| {
                let text = call.str_arg(0).unwrap_or_default();
                let chars: Vec<String> = text.chars().map(String::from).collect();
                Ok(json!(chars.join("-")))
            });

        let file = File::new("foo/bar/baz.hbs");
        let aaa = locals(json!({"aaa": "bbb"}));
        let out = p.format(":upper((zzz aaa))/index.html", &file, &aaa);
        assert_eq!(out.unwrap(), "BBB/index.html");
        assert_eq!(
            p.format(":upper((zzz (dashify aaa)))/index.html", &file, &aaa).unwrap(),
            "B-B-B/index.html"
        );
    }

    #[test]
    fn call_syntax_in_arguments() {
        let mut p = Permalinks::new();
        p.helper("name", identity).helper("upper", shout);
        let file = File::new("src/about.tmpl");
        let out = render(&p, ":name(upper(stem))/index.html", &file);
        assert_eq!(out, "ABOUT/index.html");
    }

    #[test]
    fn comma_separated_string_argument() {
        let mut p = Permalinks::new();
        p.helper("repeat", |call: &Call<'_>| {
            let raw = call.str_arg(0).unwrap_or_default();
            let (text, times) = raw.split_once(',').unwrap_or((raw, "1"));
            Ok(json!(text.repeat(times.parse()?)))
        });
        let file = File::from_props([
            ("basename", "favicon"),
            ("section", "images"),
            ("ext", ".png"),
        ]);
        let pattern = r#":section/:repeat("ab,3")-:basename:ext"#;
        assert_eq!(render(&p, pattern, &file), "images/ababab-favicon.png");
    }

    #[test]
    fn sibling_helpers() {
        let mut p = Permalinks::new();
        p.helper("upper", shout);
        p.helper("loud_stem", |call: &Call<'_>| {
            let stem = call.data().get("stem").cloned().unwrap_or(Value::Null);
            call.helper("upper", &[stem])
        });
        assert_eq!(render(&p, ":loud_stem", &File::new("a/b.md")), "B");
    }

    #[test]
    fn hash_arguments() {
        let mut p = Permalinks::new();
        p.helper("pick", |call: &Call<'_>| {
            Ok(call.hash().get("which").cloned().unwrap_or(Value::Null))
        });
        let out = render(&p, ":pick(which=\"left\")", &File::new("a.md"));
        assert_eq!(out, "left");
    }

    #[test]
    fn unresolved_variable_is_an_error() {
        let err = Permalinks::new()
            .format(":nope/index.html", &File::new("a.md"), &Map::new())
            .unwrap_err();
        match &err {
            Error::UnresolvedVariable { name } => assert_eq!(name, "nope"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            r#"cannot resolve permalink variable: ":nope""#
        );
    }

    #[test]
    fn helper_missing_can_be_replaced() {
        let mut p = Permalinks::new();
        p.helper("helperMissing", |call: &Call<'_>| match call.name() {
            "YYYY" => Ok(json!("2020")),
            "MM" => Ok(json!("05")),
            "DD" => Ok(json!("06")),
            other => anyhow::bail!("cannot resolve :{other}"),
        });

        let file = File::from_props([("basename", "foo"), ("ext", ".md")]);
        let out = render(&p, ":YYYY/:MM/:DD/:basename/index:ext", &file);
        assert_eq!(out, "2020/05/06/foo/index.md");

        let err = p.format(":other", &file, &Map::new()).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn failing_helper_surfaces_as_render_error() {
        let mut p = Permalinks::new();
        p.helper("boom", |_: &Call<'_>| anyhow::bail!("no luck"));
        let err = p.format(":boom", &File::new("a.md"), &Map::new()).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn date_helper() {
        let mut p = Permalinks::new();
        register_text_helpers(&mut p);
        let file = File::new("src/about.tmpl").with_data("date", "2017-01-01");

        let pattern = r#":date(file, "YYYY/MM/DD")/:stem/index.html"#;
        assert_eq!(render(&p, pattern, &file), "2017/01/01/about/index.html");
        assert_eq!(render(&p, r#":date("YYYY")/:stem"#, &file), "2017/about");

        let out = render(&p, ":date/:lower(stem)", &file);
        assert_eq!(out, "2017/01/01/about");
    }
}

mod presets {
    use super::*;

    #[test]
    fn stores_presets() {
        let mut p = Permalinks::new();
        p.preset("pretty", "blog/:stem/index.html");
        assert_eq!(p.preset_structure("pretty"), Some("blog/:stem/index.html"));
        assert_eq!(p.presets().len(), 1);
    }

    #[test]
    fn preset_as_structure() {
        let mut p = Permalinks::new();
        p.preset("pretty", "blog/:stem/index.html");
        let baz = File::new("foo/bar/baz.hbs");
        assert_eq!(render(&p, "pretty", &baz), "blog/baz/index.html");
    }

    #[test]
    fn preset_as_variable() {
        let mut p = Permalinks::new();
        p.preset("pretty", "blog/:stem/index.html");
        let baz = File::new("foo/bar/baz.hbs");
        assert_eq!(render(&p, "dist/:pretty", &baz), "dist/blog/baz/index.html");
    }

    #[test]
    fn several_presets() {
        let mut p = Permalinks::new();
        p.preset("one", "blog").preset("two", ":stem/index.html");
        let baz = File::new("foo/bar/baz.hbs");
        assert_eq!(render(&p, ":one/:two", &baz), "blog/baz/index.html");
    }

    #[test]
    fn mutually_recursive_presets() {
        let mut p = Permalinks::new();
        p.preset("a", ":b").preset("b", ":a");
        let err = p.format(":a", &File::new("x.md"), &Map::new()).unwrap_err();
        assert!(matches!(err, Error::PresetCycle { .. }));
    }

    #[test]
    fn unresolved_inside_a_preset() {
        let mut p = Permalinks::new();
        p.preset("pretty", ":missing/index.html");
        let err = p.format(":pretty", &File::new("x.md"), &Map::new()).unwrap_err();
        match err {
            Error::UnresolvedVariable { name } => assert_eq!(name, "missing"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

mod blocks {
    use super::*;

    #[test]
    fn conditional_prefix() {
        let p = Permalinks::new();
        let structure = ":#if(draft)drafts/:^published/:/if:stem";
        let draft = File::new("a/post.md").with_data("draft", true);
        assert_eq!(render(&p, structure, &draft), "drafts/post");
        assert_eq!(
            render(&p, structure, &File::new("a/post.md")),
            "published/post"
        );
    }

    #[test]
    fn mismatched_block() {
        let err = Permalinks::new()
            .format(":#if(a)x:/each", &File::new("a.md"), &Map::new())
            .unwrap_err();
        assert!(matches!(err, Error::Convert(_)));
        assert!(err.to_string().contains("does not match"));
    }
}

#[test]
fn global_data() {
    let mut p = Permalinks::new();
    p.data("site", json!({"section": "docs"}));
    let out = render(&p, ":site.section/:stem", &File::new("a/b.md"));
    assert_eq!(out, "docs/b");
}
