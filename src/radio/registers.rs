//! CC111x register map exposed through the bridge's update-register command
//!
//! Addresses must match the firmware's register switch exactly. `sync1`,
//! `sync0`, `pktlen` and `channr` are deliberately absent: touching them
//! breaks framing or conflicts with the separate tx/rx channel handling.

/// A register the bridge lets us write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDef {
    pub name: &'static str,
    pub address: u8,
    pub default: u8,
}

const fn reg(name: &'static str, address: u8, default: u8) -> RegisterDef {
    RegisterDef { name, address, default }
}

/// Register table, sorted by name
pub const REGISTERS: [RegisterDef; 29] = [
    reg("addr", 0x05, 0x00),
    reg("agcctrl0", 0x19, 0x91),
    reg("agcctrl1", 0x18, 0x00),
    reg("agcctrl2", 0x17, 0x07),
    reg("deviatn", 0x11, 0x15),
    reg("foccfg", 0x15, 0x17),
    reg("frend0", 0x1B, 0x11),
    reg("frend1", 0x1A, 0xB6),
    reg("freq0", 0x0B, 0x70),
    reg("freq1", 0x0A, 0x30),
    reg("freq2", 0x09, 0x26),
    reg("fscal0", 0x1F, 0x1F),
    reg("fscal1", 0x1E, 0x00),
    reg("fscal2", 0x1D, 0x2A),
    reg("fscal3", 0x1C, 0xE9),
    reg("fsctrl0", 0x08, 0x00),
    reg("fsctrl1", 0x07, 0x06),
    reg("mcsm0", 0x14, 0x18),
    reg("mcsm1", 0x13, 0x30),
    reg("mcsm2", 0x12, 0x07),
    reg("mdmcfg0", 0x10, 0x7E),
    reg("mdmcfg1", 0x0F, 0x61),
    reg("mdmcfg2", 0x0E, 0x33),
    reg("mdmcfg3", 0x0D, 0x66),
    reg("mdmcfg4", 0x0C, 0x99),
    reg("pa_table0", 0x21, 0xC0),
    reg("pa_table1", 0x20, 0x00),
    reg("pktctrl0", 0x04, 0x00),
    reg("pktctrl1", 0x03, 0x00),
];

/// Look up a register by name
pub fn lookup(name: &str) -> Option<&'static RegisterDef> {
    REGISTERS
        .binary_search_by(|r| r.name.cmp(name))
        .ok()
        .map(|i| &REGISTERS[i])
}

/// Register names in sorted order
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTERS.iter().map(|r| r.name)
}
