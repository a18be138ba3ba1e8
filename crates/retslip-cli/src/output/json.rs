use retslip_core::error::RetslipError;
use retslip_core::parsing::Assembly;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), RetslipError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Records, plus the event trace when asked for.
pub fn print_assembly(assembly: &Assembly, with_events: bool) -> Result<(), RetslipError> {
    let value = if with_events {
        serde_json::json!({
            "records": assembly.records,
            "trace": assembly.trace,
        })
    } else {
        serde_json::to_value(&assembly.records)?
    };
    print(&value)
}
