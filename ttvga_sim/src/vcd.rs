//! Value Change Dump serialisation of a [`SimulationResult`].

use std::io::{self, Write};

use bitvec::vec::BitVec;

use crate::{bits, response::SimulationResult};

pub fn write<W: Write>(
    result: &SimulationResult,
    top_module: &str,
    writer: &mut W,
) -> io::Result<()> {
    let time_step_ps = result.time_step_ps.max(1);
    writeln!(writer, "$version ttvga $end")?;
    writeln!(writer, "$timescale {time_step_ps}ps $end")?;
    writeln!(writer, "$scope module {top_module} $end")?;
    for (idx, wave) in result.waves.iter().enumerate() {
        writeln!(
            writer,
            "$var wire {} {} {} $end",
            wave.width,
            identifier(idx),
            wave.signal_name
        )?;
    }
    writeln!(writer, "$upscope $end")?;
    writeln!(writer, "$enddefinitions $end")?;

    writeln!(writer, "#0")?;
    writeln!(writer, "$dumpvars")?;
    for (idx, wave) in result.waves.iter().enumerate() {
        match wave.values.first() {
            Some((value, 0, _)) => writeln!(writer, "{}", value_change(value, idx))?,
            _ => writeln!(writer, "{}", unknown(wave.width, idx))?,
        }
    }
    writeln!(writer, "$end")?;

    let mut changes: Vec<(u64, usize, &BitVec<u32>)> = result
        .waves
        .iter()
        .enumerate()
        .flat_map(|(idx, wave)| {
            wave.values
                .iter()
                .filter(|(_, start, _)| *start > 0)
                .map(move |(value, start, _)| (*start, idx, value))
        })
        .collect();
    changes.sort_by_key(|(time, idx, _)| (*time, *idx));

    let mut last_time = 0;
    for (time, idx, value) in changes {
        if time != last_time {
            writeln!(writer, "#{}", time / time_step_ps)?;
            last_time = time;
        }
        writeln!(writer, "{}", value_change(value, idx))?;
    }
    if result.current_time > last_time {
        writeln!(writer, "#{}", result.current_time / time_step_ps)?;
    }
    Ok(())
}

/// Short printable identifier, base 94 over `!`..`~`.
fn identifier(mut idx: usize) -> String {
    let mut id = String::new();
    loop {
        id.push((b'!' + (idx % 94) as u8) as char);
        idx /= 94;
        if idx == 0 {
            break;
        }
        idx -= 1;
    }
    id
}

fn value_change(value: &BitVec<u32>, idx: usize) -> String {
    if value.len() == 1 {
        format!("{}{}", if value[0] { '1' } else { '0' }, identifier(idx))
    } else {
        format!("b{} {}", bits::binary(value), identifier(idx))
    }
}

fn unknown(width: usize, idx: usize) -> String {
    if width == 1 {
        format!("x{}", identifier(idx))
    } else {
        format!("bx {}", identifier(idx))
    }
}
