use crate::domain::release::Release;
use crate::error::Result;

/// The release list as pretty-printed JSON.
pub(super) fn render(releases: &[Release]) -> Result<String> {
    let mut out = serde_json::to_string_pretty(releases)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::{fixtures, render as render_named};
    use crate::config::Options;

    #[test]
    fn test_render_json() {
        let output = render_named("json", &fixtures::releases(), &Options::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 3);
        assert_eq!(value[0]["tag"], serde_json::Value::Null);
        assert_eq!(value[1]["title"], "v1.1.0");
        assert_eq!(value[1]["isoDate"], "2001-01-01");
        assert_eq!(value[1]["niceDate"], "1 January 2001");
        assert_eq!(value[1]["merges"][0]["id"], "5");
        assert_eq!(value[1]["fixes"][0]["fixes"][0]["id"], "12");
        assert_eq!(value[1]["commits"][0]["shorthash"], "aaaaaaa");
        assert_eq!(value[1]["commits"][0]["breaking"], true);
        assert!(output.ends_with("]\n"));
    }
}
