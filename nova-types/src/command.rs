//! The fixed server-control command table.
//!
//! Every command has two lookup keys: its numeric id, which senders may put
//! in place of the address string as a 4-byte integer, and its address
//! string. Both resolve to the same [`Command`].

/// Number of command slots, including the unused slot 0.
pub const COMMAND_COUNT: usize = 62;

/// Generates the command enum with its numeric ids and address strings
macro_rules! define_command_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident = $id:literal => $addr:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $( $variant = $id, )*
        }

        impl $name {
            /// All commands, ordered by numeric id.
            pub const ALL: [$name; COMMAND_COUNT - 1] = [ $( $name::$variant, )* ];

            /// Address string, including the leading `/`.
            pub fn address(self) -> &'static str {
                match self {
                    $( $name::$variant => $addr, )*
                }
            }

            /// String-keyed lookup; expects the full address with its leading `/`.
            pub fn from_address(address: &str) -> Option<Self> {
                match address {
                    $( $addr => Some($name::$variant), )*
                    _ => None,
                }
            }
        }
    }
}

define_command_enum! {
    /// A recognised control command.
    pub enum Command {
        Notify = 1 => "/notify",
        Status = 2 => "/status",
        Quit = 3 => "/quit",
        Cmd = 4 => "/cmd",
        DRecv = 5 => "/d_recv",
        DLoad = 6 => "/d_load",
        DLoadDir = 7 => "/d_loadDir",
        DFreeAll = 8 => "/d_freeAll",
        SNew = 9 => "/s_new",
        NTrace = 10 => "/n_trace",
        NFree = 11 => "/n_free",
        NRun = 12 => "/n_run",
        NCmd = 13 => "/n_cmd",
        NMap = 14 => "/n_map",
        NSet = 15 => "/n_set",
        NSetn = 16 => "/n_setn",
        NFill = 17 => "/n_fill",
        NBefore = 18 => "/n_before",
        NAfter = 19 => "/n_after",
        UCmd = 20 => "/u_cmd",
        GNew = 21 => "/g_new",
        GHead = 22 => "/g_head",
        GTail = 23 => "/g_tail",
        GFreeAll = 24 => "/g_freeAll",
        CSet = 25 => "/c_set",
        CSetn = 26 => "/c_setn",
        CFill = 27 => "/c_fill",
        BAlloc = 28 => "/b_alloc",
        BAllocRead = 29 => "/b_allocRead",
        BRead = 30 => "/b_read",
        BWrite = 31 => "/b_write",
        BFree = 32 => "/b_free",
        BClose = 33 => "/b_close",
        BZero = 34 => "/b_zero",
        BSet = 35 => "/b_set",
        BSetn = 36 => "/b_setn",
        BFill = 37 => "/b_fill",
        BGen = 38 => "/b_gen",
        DumpOsc = 39 => "/dumpOSC",
        CGet = 40 => "/c_get",
        CGetn = 41 => "/c_getn",
        BGet = 42 => "/b_get",
        BGetn = 43 => "/b_getn",
        SGet = 44 => "/s_get",
        SGetn = 45 => "/s_getn",
        NQuery = 46 => "/n_query",
        BQuery = 47 => "/b_query",
        NMapn = 48 => "/n_mapn",
        SNoid = 49 => "/s_noid",
        GDeepFree = 50 => "/g_deepFree",
        ClearSched = 51 => "/clearSched",
        Sync = 52 => "/sync",
        DFree = 53 => "/d_free",
        BAllocReadChannel = 54 => "/b_allocReadChannel",
        BReadChannel = 55 => "/b_readChannel",
        GDumpTree = 56 => "/g_dumpTree",
        GQueryTree = 57 => "/g_queryTree",
        Error = 58 => "/error",
        SNewargs = 59 => "/s_newargs",
        NMapa = 60 => "/n_mapa",
        NMapan = 61 => "/n_mapan",
    }
}

impl Command {
    /// Numeric id used by senders that pre-hash their addresses.
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Numeric-keyed lookup. Id 0 is reserved and never resolves.
    pub fn from_id(id: u32) -> Option<Self> {
        let index = (id as usize).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ordered_by_id() {
        for (i, cmd) in Command::ALL.iter().enumerate() {
            assert_eq!(cmd.id() as usize, i + 1, "{} out of place", cmd);
        }
    }

    #[test]
    fn both_keys_resolve_to_the_same_command() {
        for cmd in Command::ALL {
            assert_eq!(Command::from_id(cmd.id()), Some(cmd));
            assert_eq!(Command::from_address(cmd.address()), Some(cmd));
        }
    }

    #[test]
    fn well_known_ids() {
        assert_eq!(Command::from_id(1), Some(Command::Notify));
        assert_eq!(Command::from_id(2), Some(Command::Status));
        assert_eq!(Command::from_id(3), Some(Command::Quit));
        assert_eq!(Command::from_id(39), Some(Command::DumpOsc));
        assert_eq!(Command::from_id(52), Some(Command::Sync));
    }

    #[test]
    fn out_of_range_ids() {
        assert_eq!(Command::from_id(0), None);
        assert_eq!(Command::from_id(COMMAND_COUNT as u32), None);
        assert_eq!(Command::from_id(u32::MAX), None);
    }

    #[test]
    fn address_lookup_is_exact() {
        assert_eq!(Command::from_address("/dumpOSC"), Some(Command::DumpOsc));
        assert_eq!(Command::from_address("dumpOSC"), None);
        assert_eq!(Command::from_address("/dumposc"), None);
        assert_eq!(Command::from_address("/status/"), None);
    }
}
