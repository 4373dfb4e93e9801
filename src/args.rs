/// Flag spellings `go test` accepts for the coverage profile output path
const COVERPROFILE_FLAGS: &[&str] = &[
    "-coverprofile",
    "--coverprofile",
    "-test.coverprofile",
    "--test.coverprofile",
];

/// Finds where a `go test` invocation writes its coverage profile. Handles the `-flag=value` and
/// `-flag value` forms of every spelling in [`COVERPROFILE_FLAGS`], returning the value of the
/// first one found. Gives `None` if no flag is present or the flag is the last argument.
pub fn extract_flag_value<S: AsRef<str>>(args: &[S]) -> Option<&str> {
    for (i, arg) in args.iter().enumerate() {
        let arg = arg.as_ref();
        for flag in COVERPROFILE_FLAGS {
            if let Some(value) = arg
                .strip_prefix(flag)
                .and_then(|rest| rest.strip_prefix('='))
            {
                return Some(value);
            }
            if arg == *flag {
                return args.get(i + 1).map(|x| x.as_ref());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_forms() {
        let cases: Vec<(Vec<&str>, Option<&str>)> = vec![
            (vec!["-coverprofile=cover.out"], Some("cover.out")),
            (vec!["-coverprofile", "cover.out"], Some("cover.out")),
            (vec!["--coverprofile=cover.out"], Some("cover.out")),
            (vec!["--coverprofile", "cover.out"], Some("cover.out")),
            (vec!["-test.coverprofile=cover.out"], Some("cover.out")),
            (vec!["-test.coverprofile", "cover.out"], Some("cover.out")),
            (vec!["--test.coverprofile=cover.out"], Some("cover.out")),
            (
                vec!["-timeout=2m", "-coverprofile=cover.out", "-v"],
                Some("cover.out"),
            ),
            (vec!["-timeout=2m", "-v"], None),
            (vec!["-coverprofile"], None),
            (vec![], None),
        ];
        for (args, expected) in &cases {
            assert_eq!(
                extract_flag_value(&args[..]),
                *expected,
                "args: {:?}",
                args
            );
        }
    }

    #[test]
    fn first_match_wins() {
        let args = ["-coverprofile=a.out", "-test.coverprofile", "b.out"];
        assert_eq!(extract_flag_value(&args), Some("a.out"));
    }

    #[test]
    fn similar_flags_ignored() {
        let args = ["-coverprofiles=a.out", "-covermode=set", "-coverpkg", "./..."];
        assert_eq!(extract_flag_value(&args), None);
    }

    #[test]
    fn value_not_validated() {
        assert_eq!(extract_flag_value(&["-coverprofile="]), Some(""));
        assert_eq!(extract_flag_value(&["-coverprofile", "-v"]), Some("-v"));
        let owned = vec!["--coverprofile".to_string(), "c.out".to_string()];
        assert_eq!(extract_flag_value(&owned), Some("c.out"));
    }
}
