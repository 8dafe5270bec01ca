use std::io;

// https://mariadb.com/kb/en/result-set-packets/#field-types
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/binary__log__types_8h.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    OldDecimal = 0,
    TinyInt = 1,
    SmallInt = 2,
    Integer = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    Timestamp = 7,
    BigInt = 8,
    MediumInt = 9,
    Date = 10,
    Time = 11,
    DateTime = 12,
    Year = 13,
    NewDate = 14,
    VarChar = 15,
    Bit = 16,
    Json = 245,
    Decimal = 246,
    Enum = 247,
    Set = 248,
    TinyBlob = 249,
    MediumBlob = 250,
    LongBlob = 251,
    Blob = 252,
    VarString = 253,
    String = 254,
    Geometry = 255,
}

impl DataType {
    pub fn from_u8(value: u8) -> io::Result<Self> {
        Ok(match value {
            0 => DataType::OldDecimal,
            1 => DataType::TinyInt,
            2 => DataType::SmallInt,
            3 => DataType::Integer,
            4 => DataType::Float,
            5 => DataType::Double,
            6 => DataType::Null,
            7 => DataType::Timestamp,
            8 => DataType::BigInt,
            9 => DataType::MediumInt,
            10 => DataType::Date,
            11 => DataType::Time,
            12 => DataType::DateTime,
            13 => DataType::Year,
            14 => DataType::NewDate,
            15 => DataType::VarChar,
            16 => DataType::Bit,
            245 => DataType::Json,
            246 => DataType::Decimal,
            247 => DataType::Enum,
            248 => DataType::Set,
            249 => DataType::TinyBlob,
            250 => DataType::MediumBlob,
            251 => DataType::LongBlob,
            252 => DataType::Blob,
            253 => DataType::VarString,
            254 => DataType::String,
            255 => DataType::Geometry,

            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown field type {}", value),
                ));
            }
        })
    }
}
