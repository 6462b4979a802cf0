use cached::proc_macro::cached;
use ustr::Ustr;

const MEMBER_MAPPING: &[(&str, &str)] = &[("<init>", ".ctor"), ("<clinit>", ".cctor")];

pub fn member(source: Ustr) -> Ustr {
    match MEMBER_MAPPING.iter().find(|(from, _)| source == *from) {
        Some((_, to)) => (*to).into(),
        None => source,
    }
}

/// Splits `a/b/C$D` into the target namespace `a.b` and type name `C.D`.
#[cached]
pub fn type_name(source: Ustr) -> (String, String) {
    let text = source.as_str();
    match text.rfind('/') {
        Some(split) => (text[..split].replace('/', "."), text[split + 1..].replace('$', ".")),
        None => (String::new(), text.replace('$', ".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_member_names() {
        assert_eq!(member("<init>".into()), ".ctor");
        assert_eq!(member("<clinit>".into()), ".cctor");
        assert_eq!(member("run".into()), "run");
    }

    #[test]
    fn splits_type_names() {
        assert_eq!(type_name("java/lang/Object".into()), ("java.lang".to_string(), "Object".to_string()));
        assert_eq!(type_name("demo/Outer$Inner".into()), ("demo".to_string(), "Outer.Inner".to_string()));
        assert_eq!(type_name("Main".into()), (String::new(), "Main".to_string()));
    }
}
