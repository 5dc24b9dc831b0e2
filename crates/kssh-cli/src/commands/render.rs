//! Render command - print the fleet's objects without touching a cluster

use std::io::Write;

use clap::Args;

use kssh_common::GenericObject;

use super::FleetArgs;
use crate::Result;

/// Print the objects a deploy would apply as a YAML stream
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub fleet: FleetArgs,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let state = args.fleet.build()?;
    let stream = to_yaml_stream(state.objects())?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(stream.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Serialize objects as `---` separated YAML documents
pub fn to_yaml_stream<'a>(
    objects: impl IntoIterator<Item = &'a GenericObject>,
) -> Result<String> {
    let mut out = String::new();
    for object in objects {
        out.push_str("---\n");
        out.push_str(&serde_yaml::to_string(object)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kssh_common::decode_documents;

    #[test]
    fn stream_decodes_back_to_the_same_objects() {
        let objects = decode_documents(
            "kind: ConfigMap\nmetadata:\n  name: a\ndata:\n  script: \"line1\\nline2\\n\"\n---\nkind: Service\nmetadata:\n  name: b\nspec:\n  ports:\n  - port: 22\n",
        )
        .unwrap();
        let stream = to_yaml_stream(&objects).unwrap();
        assert!(stream.starts_with("---\n"));
        assert_eq!(decode_documents(&stream).unwrap(), objects);
    }

    #[test]
    fn empty_state_renders_nothing() {
        assert_eq!(to_yaml_stream(&Vec::<GenericObject>::new()).unwrap(), "");
    }
}
